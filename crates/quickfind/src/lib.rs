//! Interactive fuzzy file finder core.
//!
//! Given a root directory, this crate incrementally scans the file tree in
//! the background, accepts a live-typed search pattern, and continuously
//! re-ranks matching paths:
//! - Background scanning with pause/resume backpressure
//! - Debounced, de-duplicated query stream
//! - Pure, deterministic subsequence scoring with highlight ranges
//! - Cancel-and-restart ("latest wins") filter scheduling
//!
//! Presentation, directory traversal, and process lifecycle are external:
//! traversal is injected via [`DirectoryWalker`] and results are delivered
//! through a [`ResultsSink`].

pub mod cancel;
pub mod error;
pub mod filter;
pub mod gate;
pub mod query;
pub mod scanner;
pub mod score;
pub mod session;
pub mod types;
pub mod walk;

// Re-export main types
pub use cancel::{PassToken, PassTracker};
pub use error::{FinderError, Result};
pub use filter::{FilterScheduler, PassOutput};
pub use gate::PauseGate;
pub use query::QueryStream;
pub use scanner::{PathScanner, ScanUpdate};
pub use session::{FinderConfig, ResultsSink, Session, SessionHandle};
pub use types::{FileItem, Pattern, ScoredFileItem};
pub use walk::{DirectoryWalker, FsWalker, WalkFlow};
