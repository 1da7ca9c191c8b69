//! Background rescans of a tree shared with a presentation layer.

use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use dirsnap_core::{ScanConfig, ScanError, TreeNode};

use crate::fs::FileSystem;
use crate::progress::ScanProgress;
use crate::scanner::{ScanEngine, ScanOptions, ScanReport, resolve_root};

/// Default channel buffer size for background scan events.
pub const SCAN_CHANNEL_SIZE: usize = 100;

/// A snapshot tree that readers and background scans share.
pub type SharedTree = Arc<RwLock<TreeNode>>;

/// Wrap a root node for sharing.
pub fn shared(root: TreeNode) -> SharedTree {
    Arc::new(RwLock::new(root))
}

/// Messages emitted by a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    Progress(ScanProgress),
    Complete(Result<ScanReport, ScanError>),
}

/// Receiving end of a background scan.
#[derive(Debug)]
pub struct ScanHandle {
    events: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
}

impl ScanHandle {
    /// Next event, or `None` once the scan task has finished.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Wait for completion, discarding progress updates.
    pub async fn finish(mut self) -> Result<ScanReport, ScanError> {
        while let Some(event) = self.events.recv().await {
            if let ScanEvent::Complete(result) = event {
                return result;
            }
        }
        Err(ScanError::Other {
            message: "scan task ended without a result".to_string(),
        })
    }

    /// Stop the scan before it lists its next directory.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Rescan the node at `config.root` in `tree` on a blocking thread.
///
/// Returns a handle that receives progress updates and the final result.
/// Each scan has its own progress channel, so several scans may share one
/// engine. A relative root is resolved the same way [`ScanEngine::snapshot`]
/// resolves it. A cancelled scan leaves the node's previous children in place.
pub fn start_scan<F>(engine: Arc<ScanEngine<F>>, tree: SharedTree, config: ScanConfig) -> ScanHandle
where
    F: FileSystem + 'static,
{
    start_scan_with_cancel(engine, tree, config, CancellationToken::new())
}

/// Like [`start_scan`], driven by a caller-owned cancellation token.
pub fn start_scan_with_cancel<F>(
    engine: Arc<ScanEngine<F>>,
    tree: SharedTree,
    config: ScanConfig,
    cancel: CancellationToken,
) -> ScanHandle
where
    F: FileSystem + 'static,
{
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_SIZE);
    let token = cancel.clone();

    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = broadcast::channel(SCAN_CHANNEL_SIZE);

        // Spawn task to forward progress updates
        let tx_progress = tx.clone();
        let progress_task = tokio::spawn(async move {
            loop {
                match progress_rx.recv().await {
                    Ok(progress) => {
                        if tx_progress.send(ScanEvent::Progress(progress)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let result = tokio::task::spawn_blocking(move || {
            let root = resolve_root(&config.root)?;
            let mut options = ScanOptions::from_config(&config)?
                .progress(progress_tx)
                .on_before_scan_dir(|_| {
                    if token.is_cancelled() {
                        Err(ScanError::Interrupted)
                    } else {
                        Ok(())
                    }
                });
            engine.scan_shared(&tree, &root, &mut options)
        })
        .await
        .unwrap_or_else(|e| {
            Err(ScanError::Other {
                message: e.to_string(),
            })
        });

        // The sender dropped with the options; drain what is left.
        let _ = progress_task.await;
        let _ = tx.send(ScanEvent::Complete(result)).await;
    });

    ScanHandle { events: rx, cancel }
}
