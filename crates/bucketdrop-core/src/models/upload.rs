use serde::{Deserialize, Serialize};

use crate::format::format_bytes;

/// A file queued in the pending batch.
///
/// `id` is the position the file had when the batch was selected; removing
/// other files from the batch does not renumber it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub id: u32,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl SelectedFile {
    pub fn size_label(&self) -> String {
        format_bytes(self.size_bytes)
    }
}

/// Upload status of a history record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    InProgress,
    Success,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::InProgress)
    }
}

/// One upload attempt in the session history.
///
/// Records are append-only. `percentage` never decreases and the status leaves
/// `InProgress` exactly once: to `Success` (at 100%) when the storage backend
/// accepts the object, or to `Failed` when the transfer is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: u64,
    pub filename: String,
    pub mime_type: String,
    pub size_label: String,
    pub percentage: u8,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadRecord {
    pub fn new(id: u64, filename: String, mime_type: String, size_bytes: u64) -> Self {
        Self {
            id,
            filename,
            mime_type,
            size_label: format_bytes(size_bytes),
            percentage: 0,
            status: UploadStatus::InProgress,
            error: None,
        }
    }

    /// Apply a callback-reported percentage. Returns `true` if the record changed.
    ///
    /// Reports of 100% are held back: all bytes being sent does not mean the
    /// object was stored. Only [`mark_complete`](Self::mark_complete) reaches 100.
    pub fn apply_progress(&mut self, percentage: u8) -> bool {
        if self.status.is_terminal() || percentage >= 100 || percentage <= self.percentage {
            return false;
        }
        self.percentage = percentage;
        true
    }

    /// Mark the transfer as stored: 100% and `Success`.
    pub fn mark_complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.percentage = 100;
        self.status = UploadStatus::Success;
        true
    }

    /// Mark the transfer as rejected. Terminal records are left untouched.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = UploadStatus::Failed;
        self.error = Some(reason.into());
        true
    }
}

/// Percentage of `loaded` over `total`, rounded half up and capped at 100.
///
/// A zero `total` means there is nothing left to send and counts as complete.
pub fn progress_percentage(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (loaded as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UploadRecord {
        UploadRecord::new(0, "a.txt".into(), "text/plain".into(), 1536)
    }

    #[test]
    fn test_new_record_in_progress() {
        let r = record();
        assert_eq!(r.percentage, 0);
        assert_eq!(r.status, UploadStatus::InProgress);
        assert_eq!(r.size_label, "1.5 KB");
        assert!(r.error.is_none());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut r = record();
        assert!(r.apply_progress(40));
        assert!(!r.apply_progress(30));
        assert!(!r.apply_progress(40));
        assert_eq!(r.percentage, 40);
        assert_eq!(r.status, UploadStatus::InProgress);
    }

    #[test]
    fn test_reported_hundred_waits_for_completion() {
        let mut r = record();
        assert!(r.apply_progress(99));
        assert!(!r.apply_progress(100));
        assert_eq!(r.percentage, 99);
        assert_eq!(r.status, UploadStatus::InProgress);

        assert!(r.mark_complete());
        assert_eq!(r.percentage, 100);
        assert_eq!(r.status, UploadStatus::Success);
        assert!(!r.mark_failed("late error"));
        assert_eq!(r.status, UploadStatus::Success);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_rejected_after_full_progress_is_failed() {
        let mut r = record();
        r.apply_progress(50);
        r.apply_progress(100);
        assert!(r.mark_failed("commit rejected"));
        assert_eq!(r.status, UploadStatus::Failed);
        assert_eq!(r.percentage, 50);
    }

    #[test]
    fn test_failed_never_becomes_success() {
        let mut r = record();
        r.apply_progress(50);
        assert!(r.mark_failed("connection reset"));
        assert!(!r.apply_progress(100));
        assert!(!r.mark_complete());
        assert_eq!(r.status, UploadStatus::Failed);
        assert_eq!(r.percentage, 50);
        assert_eq!(r.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_progress_percentage_rounding() {
        assert_eq!(progress_percentage(1_048_576, 2_097_152), 50);
        assert_eq!(progress_percentage(2_097_152, 2_097_152), 100);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(1, 200), 1);
        assert_eq!(progress_percentage(0, 0), 100);
        assert_eq!(progress_percentage(10, 5), 100);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&UploadStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }
}
