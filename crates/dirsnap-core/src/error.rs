//! Error types for scanning operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied while listing a directory.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Directory removed before it could be listed.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Any other failure while listing a directory.
    #[error("Failed to list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The before-scan hook refused a directory.
    #[error("Scan hook rejected {path}: {message}")]
    Hook { path: PathBuf, message: String },

    /// Operation was interrupted.
    #[error("Operation interrupted")]
    Interrupted,

    /// Root is not an existing directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Root is a symbolic link and following it was not allowed.
    #[error("Root path is a symbolic link: {path}")]
    SymlinkRoot { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A subtree rescan targeted a node that is not in the tree.
    #[error("No node for {path} in tree")]
    NodeNotFound { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create a listing error with path context.
    pub fn listing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Listing { path, source },
        }
    }

    /// Create a hook rejection for a directory.
    pub fn hook(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Hook {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether directory enumeration itself failed.
    pub fn is_listing(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotFound { .. } | Self::Listing { .. }
        )
    }

    /// Whether the error must abort the scan even when nested failures are tolerated.
    pub fn is_fatal(&self) -> bool {
        !(self.is_listing() || matches!(self, Self::Hook { .. }))
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Listing { path, .. }
            | Self::Hook { path, .. }
            | Self::NotADirectory { path }
            | Self::SymlinkRoot { path }
            | Self::NodeNotFound { path } => Some(path),
            Self::Interrupted | Self::InvalidConfig { .. } | Self::Other { .. } => None,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory.
    ReadError,
    /// The before-scan hook refused a directory.
    HookRejected,
}

/// Non-fatal failure encountered below the scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Downgrade a swallowed nested failure into a warning.
    ///
    /// `fallback` is used when the error carries no path of its own.
    pub fn from_error(error: &ScanError, fallback: &Path) -> Self {
        let kind = match error {
            ScanError::PermissionDenied { .. } => WarningKind::PermissionDenied,
            ScanError::Hook { .. } => WarningKind::HookRejected,
            _ => WarningKind::ReadError,
        };
        let path = error.path().unwrap_or(fallback);
        Self::new(path, error.to_string(), kind)
    }
}
