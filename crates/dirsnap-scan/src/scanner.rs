//! Recursive directory snapshot engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dirsnap_core::{FileInfo, ScanConfig, ScanError, ScanWarning, Snapshot, TreeNode};

use crate::classify::classify;
use crate::filter::EntryFilter;
use crate::fs::{FileSystem, LocalFs};
use crate::progress::{ProgressTracker, ScanProgress};

/// Predicate deciding whether an entry is kept in the tree.
pub type EntryPredicate<'a> = Box<dyn Fn(&FileInfo) -> bool + 'a>;

/// Hook invoked with each directory right before it is listed.
pub type BeforeScanHook<'a> = Box<dyn FnMut(&FileInfo) -> Result<(), ScanError> + 'a>;

/// Per-call scan behaviour.
pub struct ScanOptions<'a> {
    recursive: bool,
    abort_on_child_error: bool,
    follow_root_symlink: bool,
    max_depth: Option<u32>,
    filter: Option<EntryPredicate<'a>>,
    on_before_scan_dir: Option<BeforeScanHook<'a>>,
    progress: Option<broadcast::Sender<ScanProgress>>,
}

impl<'a> ScanOptions<'a> {
    /// Recursive, aborting on any failure, no filter and no hook.
    pub fn new() -> Self {
        Self {
            recursive: true,
            abort_on_child_error: true,
            follow_root_symlink: true,
            max_depth: None,
            filter: None,
            on_before_scan_dir: None,
            progress: None,
        }
    }

    /// Derive options from a config, compiling its name filters.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let entry_filter = EntryFilter::from_config(config)?;
        Ok(Self::new()
            .recursive(config.recursive)
            .abort_on_child_error(config.abort_on_child_error)
            .follow_root_symlink(config.follow_root_symlink)
            .max_depth(config.max_depth)
            .filter(move |info| entry_filter.accepts(info)))
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Whether a failing subdirectory aborts the whole scan.
    pub fn abort_on_child_error(mut self, abort: bool) -> Self {
        self.abort_on_child_error = abort;
        self
    }

    pub fn follow_root_symlink(mut self, follow: bool) -> Self {
        self.follow_root_symlink = follow;
        self
    }

    /// Limit how many levels below the root are listed.
    pub fn max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the entry filter. Rejected directories are never descended into.
    pub fn filter(mut self, filter: impl Fn(&FileInfo) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Replace the before-scan hook. An error from the hook stops that
    /// directory from being listed and propagates like a listing failure.
    pub fn on_before_scan_dir(
        mut self,
        hook: impl FnMut(&FileInfo) -> Result<(), ScanError> + 'a,
    ) -> Self {
        self.on_before_scan_dir = Some(Box::new(hook));
        self
    }

    /// Send this scan's progress to `tx` instead of the engine's subscribers.
    pub fn progress(mut self, tx: broadcast::Sender<ScanProgress>) -> Self {
        self.progress = Some(tx);
        self
    }
}

impl Default for ScanOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScanOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("recursive", &self.recursive)
            .field("abort_on_child_error", &self.abort_on_child_error)
            .field("follow_root_symlink", &self.follow_root_symlink)
            .field("max_depth", &self.max_depth)
            .field("filter", &self.filter.is_some())
            .field("on_before_scan_dir", &self.on_before_scan_dir.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Directories listed, the root included.
    pub dirs_scanned: u64,
    /// Entries added to the tree.
    pub entries_added: u64,
    /// Entries dropped by the filter.
    pub entries_filtered: u64,
    /// Added entries that vanished before they could be inspected.
    pub entries_missing: u64,
    /// Nested failures tolerated because the scan did not abort on them.
    pub warnings: Vec<ScanWarning>,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

struct ScanContext<'o, 'a> {
    options: &'o mut ScanOptions<'a>,
    tracker: ProgressTracker,
    warnings: Vec<ScanWarning>,
}

impl ScanContext<'_, '_> {
    fn accepts(&self, info: &FileInfo) -> bool {
        self.options.filter.as_ref().is_none_or(|filter| filter(info))
    }

    /// Symlinked directories are never followed below the root.
    fn should_descend(&self, info: &FileInfo, depth: u32) -> bool {
        info.is_dir()
            && !info.is_symlink()
            && self.options.recursive
            && self.options.max_depth.is_none_or(|max| depth + 2 <= max)
    }

    fn report_progress(&self, engine_tx: &broadcast::Sender<ScanProgress>) {
        let tx = self.options.progress.as_ref().unwrap_or(engine_tx);
        let _ = tx.send(self.tracker.snapshot());
    }

    fn into_report(self) -> ScanReport {
        ScanReport {
            dirs_scanned: self.tracker.dirs_scanned(),
            entries_added: self.tracker.entries_added(),
            entries_filtered: self.tracker.entries_filtered(),
            entries_missing: self.tracker.entries_missing(),
            duration: self.tracker.elapsed(),
            warnings: self.warnings,
        }
    }
}

/// Builds sorted snapshot trees from a [`FileSystem`].
///
/// A single code path handles the root and every nested directory:
/// clear the node, run the hook, list, classify, sort by path, filter,
/// append, and recurse into plain subdirectories.
pub struct ScanEngine<F = LocalFs> {
    fs: F,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl ScanEngine<LocalFs> {
    /// Create an engine over the host filesystem.
    pub fn new() -> Self {
        Self::with_fs(LocalFs)
    }
}

impl Default for ScanEngine<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> ScanEngine<F> {
    /// Create an engine over any filesystem implementation.
    pub fn with_fs(fs: F) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { fs, progress_tx }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Subscribe to scan progress updates, sent once per listed directory.
    ///
    /// Scans whose options carry their own progress sender do not report here.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Snapshot the entry at `path`, e.g. to seed a root node.
    pub fn inspect(&self, path: &Path) -> FileInfo {
        classify(&self.fs, path)
    }

    /// Rebuild the children of `node`.
    ///
    /// The new subtree is built separately and swapped in on success. On
    /// failure `node` is left with no children: neither the stale snapshot
    /// nor partial work is kept.
    pub fn scan(
        &self,
        node: &mut TreeNode,
        options: &mut ScanOptions<'_>,
    ) -> Result<ScanReport, ScanError> {
        node.clear_children();
        let mut staged = TreeNode::new(node.info().clone());
        let report = self.build(&mut staged, options)?;
        node.replace_children(staged.take_children());
        Ok(report)
    }

    /// Scan the root named by `config` into a fresh [`Snapshot`].
    pub fn snapshot(&self, config: &ScanConfig) -> Result<Snapshot, ScanError> {
        let root_path = resolve_root(&config.root)?;
        let mut options = ScanOptions::from_config(config)?;
        let mut root = TreeNode::new(self.inspect(&root_path));

        let report = self.scan(&mut root, &mut options)?;
        Ok(Snapshot::new(
            root,
            config.clone(),
            report.duration,
            report.warnings,
        ))
    }

    /// Rescan the node at `path` inside a tree shared with readers.
    ///
    /// The lock is held only to look up the node and to swap in its new
    /// children, so readers never observe a half-built directory.
    /// Concurrent rescans of disjoint subtrees are serialized at the swap.
    ///
    /// On failure the node is left with no children, except when the scan
    /// was [`ScanError::Interrupted`]: the previous children are kept.
    pub fn scan_shared(
        &self,
        tree: &RwLock<TreeNode>,
        path: &Path,
        options: &mut ScanOptions<'_>,
    ) -> Result<ScanReport, ScanError> {
        let info = {
            let root = tree.read().unwrap_or_else(PoisonError::into_inner);
            root.find(path)
                .ok_or_else(|| ScanError::NodeNotFound {
                    path: path.to_path_buf(),
                })?
                .info()
                .clone()
        };

        let mut staged = TreeNode::new(info);
        let result = self.build(&mut staged, options);

        let mut root = tree.write().unwrap_or_else(PoisonError::into_inner);
        let node = root.find_mut(path).ok_or_else(|| ScanError::NodeNotFound {
            path: path.to_path_buf(),
        })?;
        match result {
            Ok(report) => {
                node.replace_children(staged.take_children());
                Ok(report)
            }
            Err(ScanError::Interrupted) => Err(ScanError::Interrupted),
            Err(err) => {
                node.clear_children();
                Err(err)
            }
        }
    }

    fn build(
        &self,
        staged: &mut TreeNode,
        options: &mut ScanOptions<'_>,
    ) -> Result<ScanReport, ScanError> {
        let root = staged.info();
        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.path().to_path_buf(),
            });
        }
        if root.is_symlink() && !options.follow_root_symlink {
            return Err(ScanError::SymlinkRoot {
                path: root.path().to_path_buf(),
            });
        }

        let mut ctx = ScanContext {
            options,
            tracker: ProgressTracker::new(),
            warnings: Vec::new(),
        };
        self.scan_dir(staged, 0, &mut ctx)?;

        let report = ctx.into_report();
        info!(
            root = %staged.info().path().display(),
            dirs = report.dirs_scanned,
            entries = report.entries_added,
            warnings = report.warnings.len(),
            "scan complete"
        );
        Ok(report)
    }

    fn scan_dir(
        &self,
        node: &mut TreeNode,
        depth: u32,
        ctx: &mut ScanContext<'_, '_>,
    ) -> Result<(), ScanError> {
        node.clear_children();

        if let Some(hook) = ctx.options.on_before_scan_dir.as_mut() {
            hook(node.info())?;
        }

        let dir = node.info().path();
        let listed = self
            .fs
            .list_children(dir)
            .map_err(|e| ScanError::listing(dir, e))?;

        let mut entries: Vec<FileInfo> = listed.iter().map(|p| classify(&self.fs, p)).collect();
        entries.sort_by(FileInfo::cmp_path);

        debug!(path = %dir.display(), entries = entries.len(), "listed directory");
        ctx.tracker.record_dir(dir.to_path_buf());
        ctx.report_progress(&self.progress_tx);

        for info in entries {
            if !ctx.accepts(&info) {
                ctx.tracker.record_filtered();
                continue;
            }
            if !info.exists() {
                debug!(path = %info.path().display(), "entry vanished before inspection");
                ctx.tracker.record_missing();
            }

            let descend = ctx.should_descend(&info, depth);
            ctx.tracker.record_added();
            let child = node.append_child(info);

            if descend {
                if let Err(err) = self.scan_dir(child, depth + 1, ctx) {
                    if ctx.options.abort_on_child_error || err.is_fatal() {
                        return Err(err);
                    }
                    warn!(
                        path = %child.info().path().display(),
                        error = %err,
                        "skipping unreadable directory"
                    );
                    ctx.warnings
                        .push(ScanWarning::from_error(&err, child.info().path()));
                    ctx.tracker.record_warning();
                    child.clear_children();
                }
            }
        }

        Ok(())
    }
}

/// Make a configured root absolute, the form snapshot trees are keyed by.
pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    std::path::absolute(root).map_err(|e| ScanError::InvalidConfig {
        message: format!("cannot resolve {}: {e}", root.display()),
    })
}

/// Rebuild `root`'s children from the host filesystem.
///
/// Any failure at any depth aborts the scan and is returned.
pub fn scan_tree(
    root: &mut TreeNode,
    recursive: bool,
    filter: Option<&dyn Fn(&FileInfo) -> bool>,
    on_before_scan_dir: Option<&mut dyn FnMut(&FileInfo) -> Result<(), ScanError>>,
) -> Result<(), ScanError> {
    let mut options = ScanOptions::new().recursive(recursive);
    if let Some(filter) = filter {
        options = options.filter(filter);
    }
    if let Some(hook) = on_before_scan_dir {
        options = options.on_before_scan_dir(hook);
    }
    ScanEngine::new().scan(root, &mut options).map(|_| ())
}
