//! Directory snapshot engine for dirsnap.
//!
//! This crate walks a directory subtree and builds a deterministic,
//! sorted [`TreeNode`] snapshot of it.
//!
//! # Overview
//!
//! - **One recursive algorithm** for the root and every subdirectory
//! - **Byte-wise path ordering** of siblings, whatever the listing order
//! - **Race tolerant**: entries that vanish mid-scan become `Missing`
//! - **Symlinked directories** below the root are never followed
//! - **Explicit failure policy**: abort on any nested failure, or keep
//!   going and collect warnings
//! - **Pluggable filesystem** via the [`FileSystem`] trait
//!
//! # Example
//!
//! ```rust,no_run
//! use dirsnap_scan::{ScanConfig, ScanEngine};
//!
//! let engine = ScanEngine::new();
//! let snapshot = engine.snapshot(&ScanConfig::new("/path/to/scan")).unwrap();
//!
//! for node in snapshot.root.iter() {
//!     println!("{}", node.info().path().display());
//! }
//! ```
//!
//! # Rescanning in place
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dirsnap_scan::{ScanEngine, ScanOptions, TreeNode};
//!
//! let engine = ScanEngine::new();
//! let mut root = TreeNode::new(engine.inspect(Path::new("/srv/data")));
//!
//! let mut options = ScanOptions::new()
//!     .filter(|info| !info.name().ends_with(".tmp"))
//!     .on_before_scan_dir(|dir| {
//!         println!("listing {}", dir.path().display());
//!         Ok(())
//!     });
//! let report = engine.scan(&mut root, &mut options).unwrap();
//! println!("{} directories listed", report.dirs_scanned);
//! ```

mod background;
mod classify;
mod filter;
mod fs;
mod memory;
mod progress;
mod scanner;

pub use background::{
    SCAN_CHANNEL_SIZE, ScanEvent, ScanHandle, SharedTree, shared, start_scan,
    start_scan_with_cancel,
};
pub use classify::classify;
pub use filter::EntryFilter;
pub use fs::{EntryStat, FileSystem, LocalFs};
pub use memory::MemoryFs;
pub use progress::ScanProgress;
pub use scanner::{
    BeforeScanHook, EntryPredicate, ScanEngine, ScanOptions, ScanReport, scan_tree,
};

// Re-export core types for convenience
pub use dirsnap_core::{
    EntryState, FileInfo, ScanConfig, ScanError, ScanWarning, Snapshot, TreeNode, TreeStats,
    WarningKind,
};
