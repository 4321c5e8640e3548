//! Upload batch tracking
//!
//! A batch is a list of selected files. Starting it appends one history record
//! per file, runs the transfers concurrently (bounded by
//! `max_concurrent_uploads`) and folds their progress into the history ledger.

mod ledger;
mod tracker;
mod types;

pub use ledger::{HistoryLedger, RecordUpdate};
pub use tracker::{TrackerOptions, UploadBatchTracker};
pub use types::{BatchOutcome, FileSource, RawFile, TransferFailure};
