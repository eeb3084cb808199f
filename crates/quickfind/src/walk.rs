//! The injected directory-walk capability.
//!
//! The core never traverses the disk itself; it consumes a
//! [`DirectoryWalker`] that yields ordered batches of file paths. Batch
//! boundaries are an I/O buffering detail, not semantically meaningful.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{FinderError, Result};

/// Flow control returned by the batch consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkFlow {
    Continue,
    Stop,
}

/// Walks a root directory, handing ordered, non-empty batches of discovered
/// file paths to `emit`.
///
/// The walk is finite and not restartable mid-flight. Per-entry read errors
/// (permission denied, broken symlinks) are skipped; an inaccessible root is
/// returned as a fatal error.
pub trait DirectoryWalker: Send + Sync + 'static {
    fn walk(&self, root: &Path, emit: &mut dyn FnMut(Vec<PathBuf>) -> WalkFlow) -> Result<()>;
}

/// Default batch size for [`FsWalker`].
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Directory walker built on the `ignore` crate.
///
/// Emits regular files only, in traversal order, honoring ignore rules the
/// same way other tooling does. Hidden files are included.
#[derive(Debug, Clone)]
pub struct FsWalker {
    batch_size: usize,
}

impl FsWalker {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}

impl Default for FsWalker {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl DirectoryWalker for FsWalker {
    fn walk(&self, root: &Path, emit: &mut dyn FnMut(Vec<PathBuf>) -> WalkFlow) -> Result<()> {
        let metadata = fs::metadata(root).map_err(|source| FinderError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .follow_links(false)
            .require_git(false)
            .build();

        let mut batch = Vec::with_capacity(self.batch_size);
        for entry in walker {
            // Best-effort traversal: unreadable entries are skipped.
            let Ok(entry) = entry else {
                continue;
            };
            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }
            batch.push(entry.into_path());
            if batch.len() >= self.batch_size {
                if emit(mem::take(&mut batch)) == WalkFlow::Stop {
                    return Ok(());
                }
                batch.reserve(self.batch_size);
            }
        }
        if !batch.is_empty() {
            emit(batch);
        }
        Ok(())
    }
}
