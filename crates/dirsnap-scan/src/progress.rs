//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of directories listed so far.
    pub dirs_scanned: u64,
    /// Number of entries added to the tree so far.
    pub entries_added: u64,
    /// Directory most recently listed.
    pub current_path: PathBuf,
    /// Number of tolerated nested failures so far.
    pub warnings_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_scanned: 0,
            entries_added: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters for one scan, with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    dirs_scanned: u64,
    entries_added: u64,
    entries_filtered: u64,
    entries_missing: u64,
    warnings_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            dirs_scanned: 0,
            entries_added: 0,
            entries_filtered: 0,
            entries_missing: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_dir(&mut self, path: PathBuf) {
        self.dirs_scanned += 1;
        self.current_path = path;
    }

    pub fn record_added(&mut self) {
        self.entries_added += 1;
    }

    pub fn record_filtered(&mut self) {
        self.entries_filtered += 1;
    }

    pub fn record_missing(&mut self) {
        self.entries_missing += 1;
    }

    pub fn record_warning(&mut self) {
        self.warnings_count += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn dirs_scanned(&self) -> u64 {
        self.dirs_scanned
    }

    pub fn entries_added(&self) -> u64 {
        self.entries_added
    }

    pub fn entries_filtered(&self) -> u64 {
        self.entries_filtered
    }

    pub fn entries_missing(&self) -> u64 {
        self.entries_missing
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            dirs_scanned: self.dirs_scanned,
            entries_added: self.entries_added,
            current_path: self.current_path.clone(),
            warnings_count: self.warnings_count,
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
