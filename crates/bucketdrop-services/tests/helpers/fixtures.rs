use bucketdrop_services::RawFile;
use bucketdrop_storage::ObjectSummary;
use chrono::{DateTime, TimeZone, Utc};

use super::TEST_NAMESPACE;

/// In-memory file of `size` bytes.
pub fn raw_file(name: &str, size: usize) -> RawFile {
    RawFile::from_bytes(name, "text/plain", vec![b'x'; size])
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

/// Listing entry under the test namespace.
pub fn summary(filename: &str, size: Option<u64>, last_modified: DateTime<Utc>) -> ObjectSummary {
    ObjectSummary {
        key: format!("{TEST_NAMESPACE}/{filename}"),
        size,
        last_modified,
    }
}
