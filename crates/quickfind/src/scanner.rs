//! Background directory scanning.
//!
//! [`PathScanner::spawn`] runs the injected [`DirectoryWalker`] on the
//! blocking pool and converts its path batches into [`FileItem`] batches on a
//! bounded channel. Before every emission the producer waits on the session's
//! [`PauseGate`], so a paused scan stalls at the source without losing or
//! buffering items. The stream is finite: it ends with exactly one
//! [`ScanUpdate::Completed`] or [`ScanUpdate::Failed`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::FinderError;
use crate::gate::PauseGate;
use crate::types::FileItem;
use crate::walk::{DirectoryWalker, WalkFlow};

#[derive(Debug)]
pub enum ScanUpdate {
    /// An ordered, non-empty group of newly discovered items.
    Batch(Vec<FileItem>),
    /// The tree was exhausted.
    Completed,
    /// The root itself was inaccessible; no further updates follow.
    Failed(FinderError),
}

pub struct PathScanner;

impl PathScanner {
    /// Starts scanning `root` on the blocking pool.
    ///
    /// Dropping the returned receiver stops the walk at the next batch
    /// boundary. A scan is not restartable; a new scan requires a new call.
    pub fn spawn(
        walker: Arc<dyn DirectoryWalker>,
        root: PathBuf,
        gate: Arc<PauseGate>,
        channel_capacity: usize,
    ) -> mpsc::Receiver<ScanUpdate> {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));

        tokio::task::spawn_blocking(move || {
            log::debug!("scan started: {}", root.display());
            let result = walker.walk(&root, &mut |paths: Vec<PathBuf>| {
                gate.wait_until_resumed();
                let items: Vec<FileItem> = paths
                    .into_iter()
                    .map(|path| FileItem::new(path, &root))
                    .collect();
                if tx.blocking_send(ScanUpdate::Batch(items)).is_err() {
                    WalkFlow::Stop
                } else {
                    WalkFlow::Continue
                }
            });
            match result {
                Ok(()) => {
                    log::debug!("scan finished: {}", root.display());
                    let _ = tx.blocking_send(ScanUpdate::Completed);
                }
                Err(error) => {
                    log::warn!("scan failed for {}: {error}", root.display());
                    let _ = tx.blocking_send(ScanUpdate::Failed(error));
                }
            }
        });

        rx
    }
}
