//! Turning listed paths into metadata snapshots.

use std::path::Path;

use dirsnap_core::FileInfo;

use crate::fs::FileSystem;

/// Snapshot the entry at `path`.
///
/// Never fails: an entry that disappeared after being listed becomes a
/// [`FileInfo::missing`]. Each call inspects the filesystem afresh.
pub fn classify<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> FileInfo {
    let is_symlink = fs.is_symlink(path);

    match fs.stat(path) {
        Some(stat) if stat.is_dir => FileInfo::directory(path, is_symlink),
        Some(stat) => FileInfo::file(path, stat.size, stat.modified, is_symlink),
        None => FileInfo::missing(path),
    }
}
