//! Core types for dirsnap.
//!
//! This crate provides the data model shared by the scanner and its
//! callers: per-entry metadata snapshots, the ordered snapshot tree,
//! scan configuration and errors.

mod config;
mod error;
mod info;
mod node;
mod tree;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use info::{EntryState, FileInfo};
pub use node::{Iter, TreeNode};
pub use tree::{Snapshot, TreeStats};
