//! Path validation
//!
//! Confines client-supplied relative paths to the served root. Resolution is
//! purely lexical: `.` and `..` segments are collapsed without consulting the
//! filesystem, so symlinks already present under the root are not followed
//! or rejected here.

use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Resolves `relative` against `root`.
///
/// The result is either `root` itself or a strict descendant of it.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    resolve_within(root, root, relative)
}

/// Resolves `relative` against `base`, which must itself live under `root`.
///
/// The joined result is validated against `root`, not `base`, so a name
/// resolved inside an already-resolved directory cannot climb out in two hops.
pub fn resolve_within(root: &Path, base: &Path, relative: &str) -> Result<PathBuf, PathError> {
    if relative.contains('\0') {
        return Err(PathError::Escape(relative.to_string()));
    }

    let root = normalize_lexically(root);
    let mut candidate = normalize_lexically(base);

    for component in Path::new(relative).components() {
        match component {
            // Absolute paths and drive prefixes are injection attempts.
            Component::Prefix(_) | Component::RootDir => {
                return Err(PathError::Escape(relative.to_string()));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !candidate.pop() {
                    return Err(PathError::Escape(relative.to_string()));
                }
            }
            Component::Normal(segment) => candidate.push(segment),
        }
    }

    match relative_to(&root, &candidate) {
        Some(_) => Ok(candidate),
        None => Err(PathError::Escape(relative.to_string())),
    }
}

/// Returns the path of `candidate` relative to `root`, or `None` when
/// reaching it would require a parent-directory segment.
pub fn relative_to(root: &Path, candidate: &Path) -> Option<PathBuf> {
    candidate.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Collapses `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the filesystem root stays at the root.
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
