//! Human readable size labels.

use crate::constants::UNKNOWN_SIZE_LABEL;

const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with 1024-based units and at most two decimals.
///
/// Trailing zeros are dropped, so `1536` is `"1.5 KB"` and `1024` is `"1 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    // Integer exponent search avoids float error at exact powers of 1024.
    let mut exponent = 0usize;
    let mut threshold: u128 = 1024;
    while u128::from(bytes) >= threshold && exponent < UNITS.len() - 1 {
        exponent += 1;
        threshold *= 1024;
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", trimmed, UNITS[exponent])
}

/// Size label for a listed object; missing or zero sizes read as unknown.
pub fn size_label(size: Option<u64>) -> String {
    match size {
        Some(bytes) if bytes > 0 => format_bytes(bytes),
        _ => UNKNOWN_SIZE_LABEL.to_string(),
    }
}
