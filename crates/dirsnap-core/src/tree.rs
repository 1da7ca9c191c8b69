//! Snapshot container and statistics.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::info::{EntryState, FileInfo};
use crate::node::TreeNode;

/// Summary statistics for a snapshot tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total size of regular files in bytes.
    pub total_size: u64,
    /// Total number of non-directory entries.
    pub total_files: u64,
    /// Total number of directories (root excluded).
    pub total_dirs: u64,
    /// Entries that are themselves symbolic links.
    pub total_symlinks: u64,
    /// Entries that vanished between listing and inspection.
    pub total_missing: u64,
    /// Deepest level reached below the root.
    pub max_depth: u32,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with one entry found at `depth` below the root.
    pub fn record(&mut self, info: &FileInfo, depth: u32) {
        self.max_depth = self.max_depth.max(depth);

        match info.state() {
            EntryState::Missing => self.total_missing += 1,
            EntryState::Existing {
                is_dir,
                is_symlink,
                size,
                ..
            } => {
                if *is_symlink {
                    self.total_symlinks += 1;
                }
                if *is_dir {
                    self.total_dirs += 1;
                } else {
                    self.total_files += 1;
                    self.total_size += size.unwrap_or(0);
                }
            }
        }
    }

    /// Total number of entries below the root.
    pub fn total_entries(&self) -> u64 {
        self.total_files + self.total_dirs + self.total_missing
    }
}

/// Complete result of scanning a root directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root node of the tree.
    pub root: TreeNode,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Nested failures that were tolerated during the scan.
    pub warnings: Vec<ScanWarning>,
}

impl Snapshot {
    /// Wrap a freshly scanned root node.
    pub fn new(
        root: TreeNode,
        config: ScanConfig,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        let stats = root.stats();
        Self {
            root,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Root path that was scanned.
    pub fn root_path(&self) -> &Path {
        self.root.info().path()
    }

    /// Paths of every entry in pre-order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.root
            .iter()
            .skip(1)
            .map(|node| node.info().path().to_path_buf())
            .collect()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
