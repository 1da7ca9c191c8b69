//! In-memory filesystem implementation.
//!
//! Useful for tests and for callers that snapshot synthetic trees. Beyond
//! plain files, directories and symlinks it can inject listing failures and
//! entries that vanish between listing and inspection.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};

use crate::fs::{EntryStat, FileSystem};

/// Maximum symlink hops followed before an entry is treated as dangling.
const MAX_LINK_HOPS: usize = 16;

#[derive(Debug, Clone)]
enum Entry {
    File { size: u64, modified: SystemTime },
    Directory,
    Symlink { target: PathBuf },
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<PathBuf, Entry>,
    failing: HashMap<PathBuf, io::ErrorKind>,
    vanishing: HashSet<PathBuf>,
}

/// In-memory filesystem keyed by absolute path.
///
/// Thread-safe via internal `RwLock`. Listing order follows the internal
/// hash map and is deliberately unspecified.
#[derive(Debug)]
pub struct MemoryFs {
    state: RwLock<State>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a filesystem containing only the root directory `/`.
    pub fn new() -> Self {
        let mut state = State::default();
        state.entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            state: RwLock::new(state),
        }
    }

    /// Timestamp given to every file, so snapshots compare equal across scans.
    pub fn default_modified() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    /// Add a directory, creating missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Entry::Directory);
    }

    /// Add a regular file of `size` bytes, creating missing parents.
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) {
        self.insert(
            path.as_ref(),
            Entry::File {
                size,
                modified: Self::default_modified(),
            },
        );
    }

    /// Add a symbolic link pointing at `target`, creating missing parents.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        self.insert(
            path.as_ref(),
            Entry::Symlink {
                target: target.into(),
            },
        );
    }

    /// List `path` under its parent, but make it vanish before it can be inspected.
    pub fn add_vanishing(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.write();
        Self::ensure_parents(&mut state, path);
        state.entries.remove(path);
        state.vanishing.insert(path.to_path_buf());
    }

    /// Make every listing of `dir` fail with `kind`.
    pub fn fail_listing(&self, dir: impl AsRef<Path>, kind: io::ErrorKind) {
        self.write().failing.insert(dir.as_ref().to_path_buf(), kind);
    }

    /// Let listings of `dir` succeed again.
    pub fn clear_failure(&self, dir: impl AsRef<Path>) {
        self.write().failing.remove(dir.as_ref());
    }

    /// Remove an entry and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.write();
        state.entries.retain(|p, _| !p.starts_with(path));
        state.vanishing.retain(|p| !p.starts_with(path));
    }

    fn insert(&self, path: &Path, entry: Entry) {
        let mut state = self.write();
        Self::ensure_parents(&mut state, path);
        state.vanishing.remove(path);
        state.entries.insert(path.to_path_buf(), entry);
    }

    fn ensure_parents(state: &mut State, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            state
                .entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Directory);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rewrite `path` so that none of its components is a symlink.
    fn real_path(state: &State, path: &Path, hops: &mut usize) -> Option<PathBuf> {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            if state.vanishing.contains(&current) {
                return None;
            }
            if let Entry::Symlink { target } = state.entries.get(&current)? {
                *hops += 1;
                if *hops > MAX_LINK_HOPS {
                    return None;
                }
                let joined = match current.parent() {
                    Some(parent) => parent.join(target),
                    None => target.clone(),
                };
                current = Self::real_path(state, &joined, hops)?;
            }
        }
        Some(current)
    }

    /// Follow symlinks until a non-link entry is reached.
    fn resolve<'a>(state: &'a State, path: &Path) -> Option<(PathBuf, &'a Entry)> {
        let real = Self::real_path(state, path, &mut 0)?;
        let entry = state.entries.get(&real)?;
        Some((real, entry))
    }
}

impl FileSystem for MemoryFs {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.read();

        if let Some(kind) = state.failing.get(dir) {
            return Err(io::Error::new(
                *kind,
                format!("injected failure: {}", dir.display()),
            ));
        }

        let resolved = match Self::resolve(&state, dir) {
            Some((resolved, Entry::Directory)) => resolved,
            Some(_) => {
                return Err(io::Error::other(format!(
                    "not a directory: {}",
                    dir.display()
                )));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("not found: {}", dir.display()),
                ));
            }
        };

        let children = state
            .entries
            .keys()
            .chain(state.vanishing.iter())
            .filter(|p| p.parent() == Some(resolved.as_path()))
            .filter_map(|p| p.file_name())
            .map(|name| dir.join(name))
            .collect();
        Ok(children)
    }

    fn stat(&self, path: &Path) -> Option<EntryStat> {
        let state = self.read();
        match Self::resolve(&state, path)? {
            (_, Entry::Directory) => Some(EntryStat {
                is_dir: true,
                size: 0,
                modified: None,
            }),
            (_, Entry::File { size, modified }) => Some(EntryStat {
                is_dir: false,
                size: *size,
                modified: Some(*modified),
            }),
            (_, Entry::Symlink { .. }) => None,
        }
    }

    fn is_symlink(&self, path: &Path) -> bool {
        let state = self.read();
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return false;
        };
        let Some(real_parent) = Self::real_path(&state, parent, &mut 0) else {
            return false;
        };
        let own = real_parent.join(name);
        !state.vanishing.contains(&own)
            && matches!(state.entries.get(&own), Some(Entry::Symlink { .. }))
    }
}
