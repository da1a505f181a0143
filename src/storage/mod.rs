//! File system storage management
//!
//! Handles path confinement and the directory operations built on it.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::Storage;
pub use results::{DirectoryListing, EntryKind, PendingUpload, SortKey, SortOrder};
pub use validation::{resolve, resolve_within};
