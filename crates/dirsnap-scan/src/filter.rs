//! Name-based entry filtering derived from [`ScanConfig`].

use globset::{Glob, GlobSet, GlobSetBuilder};

use dirsnap_core::{FileInfo, ScanConfig, ScanError};

/// Compiled hidden-entry and ignore-pattern rules.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    include_hidden: bool,
    ignore: GlobSet,
}

impl EntryFilter {
    /// Compile the filter described by a config.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self {
            include_hidden: config.include_hidden,
            ignore,
        })
    }

    /// Whether an entry should be kept in the tree.
    pub fn accepts(&self, info: &FileInfo) -> bool {
        let name = info.name();
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        !self.ignore.is_match(name)
    }
}
