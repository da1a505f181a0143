//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

/// Field a directory listing is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Time,
    Size,
}

impl SortKey {
    /// Parses the `sort` query parameter, falling back to name ordering.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("time") => SortKey::Time,
            Some("size") => SortKey::Size,
            _ => SortKey::Name,
        }
    }
}

/// Direction of a directory listing sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses the `order` query parameter. Time sorts default to newest first.
    pub fn from_query(value: Option<&str>, key: SortKey) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            _ if key == SortKey::Time => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// What kind of entry `create` should make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn from_form(value: &str) -> Option<Self> {
        match value {
            "file" => Some(EntryKind::File),
            "folder" => Some(EntryKind::Folder),
            _ => None,
        }
    }
}

/// An upload being streamed into `partial` until it is committed as `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub target: PathBuf,
    pub partial: PathBuf,
}

/// A single entry of a directory listing
#[derive(Debug, Clone, Serialize)]
pub struct ListedEntry {
    pub name: String,
    pub size: u64,
    pub size_display: String,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    pub is_dir: bool,
}

/// One step of the navigation trail from the root to the listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    pub sort: SortKey,
    pub order: SortOrder,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub entries: Vec<ListedEntry>,
}
