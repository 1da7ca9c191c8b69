//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for snapshotting a directory.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to snapshot.
    pub root: PathBuf,

    /// Descend into subdirectories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Abort the whole scan when a nested directory fails.
    ///
    /// When false, a failing subdirectory is kept as an empty node and
    /// reported as a warning. Failures at the root always abort.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub abort_on_child_error: bool,

    /// Scan the root even if it is a symbolic link to a directory.
    ///
    /// Symlinked directories found below the root are never followed.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub follow_root_symlink: bool,

    /// Maximum depth to list (None = unlimited, 1 = root children only).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Include hidden entries (names starting with `.`).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are dropped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let Some(ref root) = self.root else {
            return Err("Root path is required".to_string());
        };
        check(root, self.max_depth.flatten())
    }
}

fn check(root: &Path, max_depth: Option<u32>) -> Result<(), String> {
    if root.as_os_str().is_empty() {
        return Err("Root path cannot be empty".to_string());
    }
    if max_depth == Some(0) {
        return Err("Maximum depth must be at least 1".to_string());
    }
    Ok(())
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Re-check the builder's rules, for configs loaded or edited directly.
    pub fn validate(&self) -> Result<(), ScanError> {
        check(&self.root, self.max_depth).map_err(|message| ScanError::InvalidConfig { message })
    }

    /// Create a simple recursive config for a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            abort_on_child_error: true,
            follow_root_symlink: true,
            max_depth: None,
            ignore_patterns: Vec::new(),
            include_hidden: true,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
