use bucketdrop_core::{AppError, ErrorMetadata, LogLevel, StoredObjectEntry, UploadStatus};
use bucketdrop_services::RecordUpdate;
use serde::Serialize;

const KEY_COLUMN_WIDTH: usize = 40;

pub const DEFAULT_LOG_FILTER: &str = "bucketdrop=info";

/// Initialize tracing for the CLI.
///
/// `filter` is the configured `RUST_LOG` value, if any. Production runs log
/// JSON lines to stderr.
pub fn init_tracing(filter: Option<&str>, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

pub fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One progress line for an upload event.
pub fn format_update(update: &RecordUpdate) -> String {
    let status = match update.status {
        UploadStatus::InProgress => "uploading",
        UploadStatus::Success => "done",
        UploadStatus::Failed => "failed",
    };
    format!(
        "[{}] {} {:>3}% {}",
        update.id, update.filename, update.percentage, status
    )
}

/// Plain-text table of listing entries.
pub fn format_listing(entries: &[StoredObjectEntry]) -> String {
    let mut out = format!(
        "{:<width$}  {:>12}  {}\n",
        "NAME",
        "SIZE",
        "LAST MODIFIED",
        width = KEY_COLUMN_WIDTH
    );
    for entry in entries {
        out.push_str(&format!(
            "{:<width$}  {:>12}  {}\n",
            truncate_string(&entry.key, KEY_COLUMN_WIDTH),
            entry.size_label,
            entry.last_modified.format("%Y-%m-%d %H:%M:%S"),
            width = KEY_COLUMN_WIDTH
        ));
    }
    out
}

/// Lines shown to the user for a failed command.
pub fn error_lines(err: &AppError) -> Vec<String> {
    let mut lines = vec![format!("error: {}", err.client_message())];
    if let Some(action) = err.suggested_action() {
        lines.push(format!("hint: {}", action));
    }
    if err.is_recoverable() {
        lines.push("note: this failure may be temporary, run the command again".to_string());
    }
    lines
}

/// Log an error at its configured level and print the user-facing message.
pub fn report_error(err: &AppError) {
    let code = err.error_code();
    let recoverable = err.is_recoverable();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error_code = code, recoverable, error = %err.detailed_message())
        }
        LogLevel::Warn => {
            tracing::warn!(error_code = code, recoverable, error = %err.detailed_message())
        }
        LogLevel::Error => {
            tracing::error!(error_code = code, recoverable, error = %err.detailed_message())
        }
    }

    for line in error_lines(err) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_exact() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("résumé-final.pdf", 9), "résumé...");
    }

    #[test]
    fn format_update_line() {
        let update = RecordUpdate {
            id: 3,
            filename: "a.txt".to_string(),
            percentage: 50,
            status: UploadStatus::InProgress,
        };
        assert_eq!(format_update(&update), "[3] a.txt  50% uploading");
    }

    #[test]
    fn error_lines_mark_retryable_errors() {
        let lines = error_lines(&AppError::Storage("503 SlowDown".to_string()));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error: "));
        assert_eq!(lines[1], "hint: Retry after a short delay");
        assert!(lines[2].starts_with("note: "));
    }

    #[test]
    fn error_lines_without_retry_note() {
        let lines = error_lines(&AppError::Config("USER_EMAIL is required".to_string()));
        assert_eq!(
            lines,
            vec![
                format!(
                    "error: {}",
                    AppError::Config("USER_EMAIL is required".to_string()).client_message()
                ),
                "hint: Check the environment variables and .env file".to_string(),
            ]
        );
    }

    #[test]
    fn format_listing_rows() {
        let entries = vec![StoredObjectEntry {
            key: "a.txt".to_string(),
            size_label: "1.5 KB".to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }];
        let table = format_listing(&entries);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("a.txt"));
        assert!(lines[1].contains("1.5 KB"));
        assert!(lines[1].ends_with("2024-03-01 09:30:00"));
    }
}
