//! Filesystem collaborator used by the scanner.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What a single `stat` call reports about a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    /// True if the entry (after following links) is a directory.
    pub is_dir: bool,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
}

/// Filesystem primitives consumed by the scanner.
///
/// Listing is the only fallible operation. Inspection answers `None` or
/// `false` for entries that do not exist, so a path that disappears
/// between listing and inspection never surfaces as an error.
pub trait FileSystem: Send + Sync {
    /// List the absolute paths of the immediate children of `dir`.
    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Inspect an entry, following symbolic links. `None` if it does not exist.
    fn stat(&self, path: &Path) -> Option<EntryStat>;

    /// Check whether the entry itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_some()
    }

    /// Check if a path resolves to a directory.
    fn is_dir(&self, path: &Path) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_dir)
    }

    /// Size of an existing entry.
    fn size(&self, path: &Path) -> Option<u64> {
        self.stat(path).map(|stat| stat.size)
    }

    /// Modification time of an existing entry.
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.stat(path).and_then(|stat| stat.modified)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).list_children(dir)
    }

    fn stat(&self, path: &Path) -> Option<EntryStat> {
        (**self).stat(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        (**self).is_symlink(path)
    }
}

/// The host filesystem via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn stat(&self, path: &Path) -> Option<EntryStat> {
        let metadata = fs::metadata(path).ok()?;
        Some(EntryStat {
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}
