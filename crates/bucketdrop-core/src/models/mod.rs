pub mod listing;
pub mod upload;

pub use listing::{ContinuationToken, LoadMoreMode, StoredObjectEntry};
pub use upload::{progress_percentage, SelectedFile, UploadRecord, UploadStatus};
