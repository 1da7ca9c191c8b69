//! Per-entry metadata snapshots.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// State of an entry at the instant it was inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryState {
    /// The entry existed when it was inspected.
    Existing {
        /// Whether the entry resolves to a directory.
        is_dir: bool,
        /// Whether the entry itself is a symbolic link.
        is_symlink: bool,
        /// Size in bytes (files only).
        size: Option<u64>,
        /// Last modification time (files only, when the platform reports one).
        modified: Option<SystemTime>,
    },
    /// The entry was listed but had vanished by the time it was inspected.
    Missing,
}

/// Immutable snapshot of one filesystem entry.
///
/// A `FileInfo` is never mutated after construction; re-scanning a
/// directory produces fresh values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    path: PathBuf,
    name: CompactString,
    state: EntryState,
}

impl FileInfo {
    /// Snapshot of a directory.
    pub fn directory(path: impl Into<PathBuf>, is_symlink: bool) -> Self {
        Self::with_state(
            path.into(),
            EntryState::Existing {
                is_dir: true,
                is_symlink,
                size: None,
                modified: None,
            },
        )
    }

    /// Snapshot of a regular (or other non-directory) entry.
    pub fn file(
        path: impl Into<PathBuf>,
        size: u64,
        modified: Option<SystemTime>,
        is_symlink: bool,
    ) -> Self {
        Self::with_state(
            path.into(),
            EntryState::Existing {
                is_dir: false,
                is_symlink,
                size: Some(size),
                modified,
            },
        )
    }

    /// Snapshot of an entry that no longer exists.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::with_state(path.into(), EntryState::Missing)
    }

    fn with_state(path: PathBuf, state: EntryState) -> Self {
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(path.to_string_lossy()));
        Self { path, name, state }
    }

    /// Absolute path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component (or the whole path for filesystem roots).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    /// Check whether the entry existed when inspected.
    pub fn exists(&self) -> bool {
        matches!(self.state, EntryState::Existing { .. })
    }

    /// Check whether the entry resolves to a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.state, EntryState::Existing { is_dir: true, .. })
    }

    /// Check whether the entry is itself a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(
            self.state,
            EntryState::Existing {
                is_symlink: true,
                ..
            }
        )
    }

    /// Size in bytes, present only for existing non-directories.
    pub fn size(&self) -> Option<u64> {
        match self.state {
            EntryState::Existing { size, .. } => size,
            EntryState::Missing => None,
        }
    }

    /// Modification time, present only for existing non-directories.
    pub fn modified(&self) -> Option<SystemTime> {
        match self.state {
            EntryState::Existing { modified, .. } => modified,
            EntryState::Missing => None,
        }
    }

    /// Byte-wise ordering of absolute paths.
    ///
    /// Independent of locale and of the order the platform lists entries in.
    pub fn cmp_path(&self, other: &Self) -> Ordering {
        self.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(other.path.as_os_str().as_encoded_bytes())
    }
}
