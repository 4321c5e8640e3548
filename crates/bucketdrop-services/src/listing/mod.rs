//! Paginated listing of the objects stored in the caller's namespace.

mod paginator;

pub use paginator::{FileListingPaginator, ListingPage, LoadOutcome, PaginatorOptions};
