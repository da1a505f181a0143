//! Storage operations
//!
//! Handles filesystem operations for the HTTP handlers: listing, creating,
//! renaming, deleting, and preparing upload targets. Whole-directory
//! mutations and listing snapshots are serialized behind a single lock.

use log::{debug, info, warn};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, File, OpenOptions};
use tokio::sync::Mutex;

use crate::error::{PathError, StorageError};
use crate::storage::results::{
    Breadcrumb, DirectoryListing, EntryKind, ListedEntry, PendingUpload, SortKey, SortOrder,
};
use crate::storage::validation::{relative_to, resolve, resolve_within};
use crate::utils::format_size;

/// Name of the first breadcrumb, which always points at the served root.
pub const ROOT_CRUMB: &str = "Root";

/// The served directory tree.
pub struct Storage {
    root: PathBuf,
    dir_lock: Mutex<()>,
}

impl Storage {
    /// `root` should already be absolute; the server canonicalizes it at startup.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            dir_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a client-supplied directory path under the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PathError> {
        resolve(&self.root, relative)
    }

    /// Resolves `name` inside `dir`, both client-supplied.
    pub fn resolve_entry(&self, dir: &str, name: &str) -> Result<PathBuf, PathError> {
        let base = resolve(&self.root, dir)?;
        resolve_within(&self.root, &base, name)
    }

    /// Lists a directory, sorted by `key` in `order`.
    pub async fn list_directory(
        &self,
        relative: &str,
        key: SortKey,
        order: SortOrder,
    ) -> Result<DirectoryListing, StorageError> {
        let dir = self.resolve(relative)?;

        let mut entries = {
            let _guard = self.dir_lock.lock().await;
            read_entries(&dir)
                .await
                .map_err(|e| self.map_io(e, &dir))?
        };
        sort_entries(&mut entries, key, order);

        debug!(
            "Listed directory {} - {} entries",
            self.display(&dir),
            entries.len()
        );

        Ok(DirectoryListing {
            path: relative.to_string(),
            sort: key,
            order,
            breadcrumbs: breadcrumbs(relative),
            entries,
        })
    }

    /// Creates an empty file or a folder named `name` inside `dir`.
    pub async fn create_entry(
        &self,
        dir: &str,
        name: &str,
        kind: EntryKind,
    ) -> Result<PathBuf, StorageError> {
        require_name(name)?;
        let target = self.resolve_entry(dir, name)?;
        self.protect_root(&target)?;

        let _guard = self.dir_lock.lock().await;
        let created = match kind {
            EntryKind::File => OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
                .map(drop),
            EntryKind::Folder => fs::create_dir(&target).await,
        };
        created.map_err(|e| self.map_io(e, &target))?;

        info!("Created {:?} {}", kind, self.display(&target));
        Ok(target)
    }

    /// Renames `old` to `new`, both relative to `dir`.
    pub async fn rename_entry(&self, dir: &str, old: &str, new: &str) -> Result<(), StorageError> {
        if old.is_empty() || new.is_empty() {
            return Err(StorageError::InvalidName("missing old or new name".into()));
        }
        let from = self.resolve_entry(dir, old)?;
        let to = self.resolve_entry(dir, new)?;
        self.protect_root(&from)?;
        self.protect_root(&to)?;

        let _guard = self.dir_lock.lock().await;
        fs::rename(&from, &to)
            .await
            .map_err(|e| self.map_io(e, &from))?;

        info!("Renamed {} to {}", self.display(&from), self.display(&to));
        Ok(())
    }

    /// Deletes a file, or a directory and everything below it.
    pub async fn delete_entry(&self, dir: &str, name: &str) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidName("no file specified".into()));
        }
        let target = self.resolve_entry(dir, name)?;
        self.protect_root(&target)?;

        let _guard = self.dir_lock.lock().await;
        let metadata = fs::symlink_metadata(&target)
            .await
            .map_err(|e| self.map_io(e, &target))?;
        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&target).await
        } else {
            fs::remove_file(&target).await
        };
        removed.map_err(|e| self.map_io(e, &target))?;

        info!("Deleted {}", self.display(&target));
        Ok(())
    }

    /// Opens a fresh partial file next to the upload's final name.
    ///
    /// Only path resolution and creation happen under the directory lock; the
    /// caller streams the body into the returned handle without holding it,
    /// then either commits or discards the upload. An existing file with the
    /// same name is untouched until commit.
    pub async fn create_upload_target(
        &self,
        dir: &Path,
        filename: &str,
    ) -> Result<(PendingUpload, File), StorageError> {
        require_name(filename)?;
        let target = resolve_within(&self.root, dir, filename)?;
        self.protect_root(&target)?;
        let partial = partial_path(&target);

        let _guard = self.dir_lock.lock().await;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
            .await
            .map_err(|e| self.map_io(e, &partial))?;
        Ok((PendingUpload { target, partial }, file))
    }

    /// Moves a fully written upload onto its final name.
    pub async fn commit_upload(&self, upload: &PendingUpload) -> Result<(), StorageError> {
        let renamed = {
            let _guard = self.dir_lock.lock().await;
            fs::rename(&upload.partial, &upload.target).await
        };
        if let Err(e) = renamed {
            self.discard_upload(upload).await;
            return Err(self.map_io(e, &upload.target));
        }
        Ok(())
    }

    /// Removes the partial file of an upload that did not complete.
    pub async fn discard_upload(&self, upload: &PendingUpload) {
        if let Err(e) = fs::remove_file(&upload.partial).await {
            warn!("Could not remove partial upload {:?}: {}", upload.partial, e);
        }
    }

    /// Root-relative rendering of `path` for messages and logs.
    pub fn display(&self, path: &Path) -> String {
        match relative_to(&self.root, path) {
            Some(rel) if rel.as_os_str().is_empty() => "/".to_string(),
            Some(rel) => rel.to_string_lossy().into_owned(),
            None => "<outside root>".to_string(),
        }
    }

    fn protect_root(&self, target: &Path) -> Result<(), StorageError> {
        if target == self.root {
            return Err(StorageError::RootProtected);
        }
        Ok(())
    }

    fn map_io(&self, err: io::Error, path: &Path) -> StorageError {
        match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(self.display(path)),
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(self.display(path)),
            ErrorKind::NotADirectory => StorageError::NotADirectory(self.display(path)),
            ErrorKind::IsADirectory => StorageError::IsDirectory(self.display(path)),
            _ => StorageError::Io(err),
        }
    }
}

/// Hidden sibling of `target` an upload is streamed into before commit.
fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{:08x}.part", rand::random::<u32>()))
}

/// Names must end in a real segment, not `.` or `..`.
fn require_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || Path::new(name).file_name().is_none() {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

async fn read_entries(dir: &Path) -> io::Result<Vec<ListedEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        // Entries that vanish or cannot be stat'ed mid-listing are skipped.
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        let is_dir = metadata.is_dir();
        let size = if is_dir { 0 } else { metadata.len() };
        entries.push(ListedEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size,
            size_display: if is_dir { String::new() } else { format_size(size) },
            modified: OffsetDateTime::from(modified),
            is_dir,
        });
    }

    Ok(entries)
}

pub fn sort_entries(entries: &mut [ListedEntry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Time => a.modified.cmp(&b.modified),
            SortKey::Size => a.size.cmp(&b.size),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Builds the navigation trail for a slash-separated relative directory.
pub fn breadcrumbs(relative: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        name: ROOT_CRUMB.to_string(),
        path: String::new(),
    }];
    let mut cumulative = String::new();

    for part in relative.split('/').filter(|p| !p.is_empty()) {
        if !cumulative.is_empty() {
            cumulative.push('/');
        }
        cumulative.push_str(part);
        crumbs.push(Breadcrumb {
            name: part.to_string(),
            path: cumulative.clone(),
        });
    }

    crumbs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    fn setup() -> (TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::write(root.join("b.txt"), vec![0u8; 10]).unwrap();
        std::fs::write(root.join("A.txt"), vec![0u8; 300]).unwrap();
        std::fs::create_dir(root.join("docs")).unwrap();
        std::fs::write(root.join("docs/inner.txt"), b"inner").unwrap();
        (dir, Storage::new(root))
    }

    fn names(listing: &DirectoryListing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_case_insensitively_by_name() {
        let (_dir, storage) = setup();
        let listing = storage
            .list_directory("", SortKey::Name, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec!["A.txt", "b.txt", "docs"]);

        let docs = listing.entries.iter().find(|e| e.name == "docs").unwrap();
        assert!(docs.is_dir);
        assert_eq!(docs.size_display, "");
    }

    #[tokio::test]
    async fn lists_by_size_descending() {
        let (_dir, storage) = setup();
        let listing = storage
            .list_directory("", SortKey::Size, SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec!["A.txt", "b.txt", "docs"]);
        assert_eq!(listing.entries[0].size_display, "300.00 B");
    }

    #[tokio::test]
    async fn listing_outside_root_is_rejected() {
        let (_dir, storage) = setup();
        let err = storage
            .list_directory("../", SortKey::Name, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(PathError::Escape(_))));
    }

    #[tokio::test]
    async fn listing_a_missing_directory_is_not_found() {
        let (_dir, storage) = setup();
        let err = storage
            .list_directory("nope", SortKey::Name, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn creates_files_and_folders_once() {
        let (_dir, storage) = setup();
        let file = storage
            .create_entry("docs", "new.txt", EntryKind::File)
            .await
            .unwrap();
        assert!(file.is_file());

        let err = storage
            .create_entry("docs", "new.txt", EntryKind::File)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let folder = storage
            .create_entry("", "photos", EntryKind::Folder)
            .await
            .unwrap();
        assert!(folder.is_dir());
    }

    #[tokio::test]
    async fn create_rejects_dot_names_and_escapes() {
        let (_dir, storage) = setup();
        assert!(matches!(
            storage.create_entry("", "..", EntryKind::Folder).await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            storage.create_entry("docs", "../../x", EntryKind::File).await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn renames_within_a_directory() {
        let (_dir, storage) = setup();
        storage.rename_entry("docs", "inner.txt", "renamed.txt").await.unwrap();
        assert!(storage.root().join("docs/renamed.txt").is_file());
        assert!(!storage.root().join("docs/inner.txt").exists());
    }

    #[tokio::test]
    async fn rename_cannot_move_out_of_root() {
        let (_dir, storage) = setup();
        let err = storage
            .rename_entry("docs", "inner.txt", "../../stolen.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn deletes_directories_recursively() {
        let (_dir, storage) = setup();
        storage.delete_entry("", "docs").await.unwrap();
        assert!(!storage.root().join("docs").exists());

        let err = storage.delete_entry("", "docs").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn refuses_to_delete_the_root() {
        let (_dir, storage) = setup();
        let err = storage.delete_entry("docs", "..").await.unwrap_err();
        assert!(matches!(err, StorageError::RootProtected));
        assert!(storage.root().exists());
    }

    #[tokio::test]
    async fn upload_is_staged_then_committed_inside_the_directory() {
        let (_dir, storage) = setup();
        let docs = storage.resolve("docs").unwrap();
        let (upload, mut file) = storage
            .create_upload_target(&docs, "upload.bin")
            .await
            .unwrap();
        assert_eq!(upload.target, storage.root().join("docs/upload.bin"));
        assert_eq!(upload.partial.parent(), upload.target.parent());
        assert!(!upload.target.exists());

        file.write_all(b"payload").await.unwrap();
        drop(file);
        storage.commit_upload(&upload).await.unwrap();
        assert_eq!(std::fs::read(&upload.target).unwrap(), b"payload");
        assert!(!upload.partial.exists());

        assert!(storage.create_upload_target(&docs, "../../evil").await.is_err());
    }

    #[tokio::test]
    async fn discarded_upload_keeps_the_previous_file() {
        let (_dir, storage) = setup();
        let docs = storage.resolve("docs").unwrap();
        let (upload, mut file) = storage
            .create_upload_target(&docs, "inner.txt")
            .await
            .unwrap();
        file.write_all(b"half").await.unwrap();
        drop(file);

        storage.discard_upload(&upload).await;
        assert_eq!(std::fs::read(&upload.target).unwrap(), b"inner");
        assert!(!upload.partial.exists());
    }

    #[tokio::test]
    async fn listing_a_regular_file_is_rejected() {
        let (_dir, storage) = setup();
        let err = storage
            .list_directory("b.txt", SortKey::Name, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory(_)));
    }

    #[test]
    fn breadcrumbs_accumulate_path_segments() {
        let crumbs = breadcrumbs("a//b/c/");
        let paths: Vec<&str> = crumbs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["", "a", "a/b", "a/b/c"]);
        assert_eq!(crumbs[0].name, ROOT_CRUMB);
    }
}
