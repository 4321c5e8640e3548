//! Bucketdrop Services
//!
//! The two workflows built on top of the storage and identity collaborators:
//!
//! - [`upload::UploadBatchTracker`] turns a selection of files into concurrent
//!   transfers and keeps a per-file progress history.
//! - [`listing::FileListingPaginator`] pages through the objects already
//!   stored in the user's namespace.

pub mod error;
pub mod identity;
pub mod listing;
pub mod upload;

pub use error::{ListingError, UploadError};
pub use identity::{IdentityError, IdentityProvider, Principal, StaticIdentity};
pub use listing::{FileListingPaginator, ListingPage, LoadOutcome, PaginatorOptions};
pub use upload::{
    BatchOutcome, FileSource, HistoryLedger, RawFile, RecordUpdate, TrackerOptions,
    TransferFailure, UploadBatchTracker,
};
