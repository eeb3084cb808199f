//! Generation-based cancellation for ranking passes.
//!
//! Every filter trigger bumps the tracker's generation. A running pass
//! captures the generation it was started for and checks it between item
//! evaluations; once the generations diverge the pass is superseded and must
//! stop without publishing. This cancels in-flight work cooperatively, with
//! no thread termination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks the generation of the most recent filter trigger.
#[derive(Debug, Default)]
pub struct PassTracker {
    active: AtomicU64,
}

impl PassTracker {
    pub fn new() -> Self {
        Self {
            active: AtomicU64::new(0),
        }
    }

    /// Increments the active generation and returns the new value.
    ///
    /// This supersedes any in-flight pass holding an older token.
    pub fn bump(&self) -> u64 {
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current active generation.
    pub fn current(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// A token held by one ranking pass, valid while its generation is current.
#[derive(Clone, Debug)]
pub struct PassToken {
    tracker: Arc<PassTracker>,
    generation: u64,
}

impl PassToken {
    pub fn new(tracker: Arc<PassTracker>, generation: u64) -> Self {
        Self {
            tracker,
            generation,
        }
    }

    /// The generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `Some(())` while the pass is still current, `None` once it has
    /// been superseded. Enables early returns with the `?` operator.
    #[inline]
    pub fn check(&self) -> Option<()> {
        if self.generation == self.tracker.current() {
            Some(())
        } else {
            None
        }
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.check().is_some()
    }
}
