// src/watch/resolve.rs

//! Entry path resolution for the watcher.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, WatchError};

/// Joins `entry_path` onto `base`, follows one symlink level, and checks the
/// result is an existing regular file. The link target is not chased further;
/// watching a chain of links watches the first target.
///
/// Errors with [`WatchError::NotFound`] when the path (or its link target) is
/// missing and [`WatchError::NotAFile`] for directories and other non-file
/// types.
pub fn resolve_watch_path(base: &Path, entry_path: &str) -> Result<PathBuf> {
    let joined = base.join(entry_path);
    let meta =
        fs::symlink_metadata(&joined).map_err(|_| WatchError::NotFound(joined.clone()))?;

    let resolved = if meta.file_type().is_symlink() {
        let target = fs::read_link(&joined)?;
        if target.is_absolute() {
            target
        } else {
            // Relative link targets resolve against the link's own directory.
            joined.parent().unwrap_or(base).join(target)
        }
    } else {
        joined
    };

    let resolved_meta =
        fs::metadata(&resolved).map_err(|_| WatchError::NotFound(resolved.clone()))?;
    if !resolved_meta.is_file() {
        return Err(WatchError::NotAFile(resolved));
    }
    Ok(resolved)
}
