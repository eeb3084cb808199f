//! Per-invocation orchestration.
//!
//! A session wires the scanner, the debounced query stream, and the filter
//! scheduler together behind a single coordinating event loop, the same
//! actor shape the rest of our runtime uses: shared state (the accumulated
//! count, the pause decision, all sink traffic) is touched only by the actor
//! task, so no locks are needed beyond the scanner's pause gate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{FinderError, Result};
use crate::filter::{FilterScheduler, PassOutput};
use crate::gate::PauseGate;
use crate::query::QueryStream;
use crate::scanner::{PathScanner, ScanUpdate};
use crate::types::{Pattern, ScoredFileItem};
use crate::walk::DirectoryWalker;

/// Receives ranked result sets and scan progress signals.
///
/// `publish` replaces the previous result set wholesale; `total_count` is the
/// running number of accumulated items, for display. `scan_started` /
/// `scan_finished` bracket each scan's lifetime.
pub trait ResultsSink: Send + Sync + 'static {
    fn publish(&self, results: Vec<ScoredFileItem>, total_count: usize);
    fn scan_started(&self);
    fn scan_finished(&self);
}

#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Quiet period between pattern emissions.
    pub debounce: Duration,
    /// Capacity of the scanner's batch channel.
    pub scan_channel_capacity: usize,
    /// Accepted-but-unranked item count above which the scanner is paused
    /// until ranking catches up.
    pub pause_backlog_threshold: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            scan_channel_capacity: 4,
            pause_backlog_threshold: 50_000,
        }
    }
}

enum SessionControl {
    SetRoot(PathBuf),
    Close,
}

pub struct Session;

impl Session {
    /// Opens a finder session over `root`.
    ///
    /// Starts the background scan immediately. Must be called within a tokio
    /// runtime. Dropping the handle closes the session.
    pub fn open(
        root: impl Into<PathBuf>,
        walker: Arc<dyn DirectoryWalker>,
        sink: Arc<dyn ResultsSink>,
        config: FinderConfig,
    ) -> SessionHandle {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (raw_tx, pattern_rx) = QueryStream::spawn(config.debounce);
        let input_tx = Arc::new(Mutex::new(raw_tx));
        let actor = SessionActor::new(
            root.into(),
            walker,
            sink,
            config,
            control_rx,
            input_tx.clone(),
            pattern_rx,
        );
        tokio::spawn(actor.run());
        SessionHandle {
            control_tx,
            input_tx,
        }
    }
}

/// Control surface for one open session.
///
/// The raw input sender sits behind a shared slot because a root change
/// replaces the query stream wholesale; events typed concurrently with the
/// change go to whichever stream the slot holds at that instant.
pub struct SessionHandle {
    control_tx: mpsc::UnboundedSender<SessionControl>,
    input_tx: Arc<Mutex<mpsc::UnboundedSender<String>>>,
}

impl SessionHandle {
    /// Feeds a raw text-change event into the debounced query stream.
    pub fn input_changed(&self, text: &str) -> Result<()> {
        self.input_tx
            .lock()
            .send(text.to_string())
            .map_err(|_| FinderError::SessionClosed)
    }

    /// Points the session at a new root, resetting all accumulated state.
    ///
    /// Equivalent to closing and reopening the finder: the query stream is
    /// replaced along with everything else, so the pattern starts out empty.
    pub fn set_root(&self, root: impl Into<PathBuf>) -> Result<()> {
        self.control_tx
            .send(SessionControl::SetRoot(root.into()))
            .map_err(|_| FinderError::SessionClosed)
    }

    /// Closes the session: cancels the scan and any in-flight ranking pass,
    /// discards accumulated state, and publishes an empty result set.
    pub fn close(&self) {
        let _ = self.control_tx.send(SessionControl::Close);
    }
}

struct SessionActor {
    root: PathBuf,
    walker: Arc<dyn DirectoryWalker>,
    sink: Arc<dyn ResultsSink>,
    config: FinderConfig,

    control_rx: mpsc::UnboundedReceiver<SessionControl>,
    input_slot: Arc<Mutex<mpsc::UnboundedSender<String>>>,
    pattern_rx: mpsc::UnboundedReceiver<Pattern>,
    output_rx: mpsc::UnboundedReceiver<PassOutput>,
    scan_rx: mpsc::Receiver<ScanUpdate>,

    scheduler: FilterScheduler,
    gate: Arc<PauseGate>,

    /// Running total of accepted items; monotone within one scan.
    accepted_count: usize,
    /// Accumulated items covered by the last published pass.
    ranked_through: usize,
    scan_done: bool,
}

impl SessionActor {
    fn new(
        root: PathBuf,
        walker: Arc<dyn DirectoryWalker>,
        sink: Arc<dyn ResultsSink>,
        config: FinderConfig,
        control_rx: mpsc::UnboundedReceiver<SessionControl>,
        input_slot: Arc<Mutex<mpsc::UnboundedSender<String>>>,
        pattern_rx: mpsc::UnboundedReceiver<Pattern>,
    ) -> Self {
        let (scheduler, output_rx) = spawn_scheduler();
        let (gate, scan_rx) = start_scan(&walker, &root, &config, &sink);
        Self {
            root,
            walker,
            sink,
            config,
            control_rx,
            input_slot,
            pattern_rx,
            output_rx,
            scan_rx,
            scheduler,
            gate,
            accepted_count: 0,
            ranked_through: 0,
            scan_done: false,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                control = self.control_rx.recv() => match control {
                    Some(SessionControl::SetRoot(root)) => self.reset(root),
                    Some(SessionControl::Close) | None => break,
                },
                Some(output) = self.output_rx.recv() => self.on_pass_output(output),
                Some(pattern) = self.pattern_rx.recv() => self.on_pattern(pattern),
                update = self.scan_rx.recv(), if !self.scan_done => self.on_scan_update(update),
            }
        }
        self.shutdown();
    }

    fn on_scan_update(&mut self, update: Option<ScanUpdate>) {
        match update {
            Some(ScanUpdate::Batch(batch)) => {
                self.accepted_count += batch.len();
                self.scheduler.append(batch);
                self.maybe_pause();
            }
            Some(ScanUpdate::Completed) => {
                self.scan_done = true;
                self.sink.scan_finished();
            }
            Some(ScanUpdate::Failed(error)) => {
                log::warn!("scan of {} failed: {error}", self.root.display());
                self.scan_done = true;
                self.sink.publish(Vec::new(), 0);
                self.sink.scan_finished();
            }
            // Producer gone without a terminal update; treat as finished.
            None => {
                self.scan_done = true;
                self.sink.scan_finished();
            }
        }
    }

    fn on_pattern(&mut self, pattern: Pattern) {
        self.scheduler.set_pattern(pattern);
    }

    fn on_pass_output(&mut self, output: PassOutput) {
        self.ranked_through = self.ranked_through.max(output.total);
        self.sink.publish(output.results, output.total);
        self.maybe_resume();
    }

    fn backlog(&self) -> usize {
        self.accepted_count.saturating_sub(self.ranked_through)
    }

    fn maybe_pause(&self) {
        if self.backlog() > self.config.pause_backlog_threshold && !self.gate.is_paused() {
            log::debug!(
                "pausing scan: {} unranked items exceed threshold {}",
                self.backlog(),
                self.config.pause_backlog_threshold
            );
            self.gate.pause();
        }
    }

    fn maybe_resume(&self) {
        if self.gate.is_paused() && self.backlog() <= self.config.pause_backlog_threshold {
            log::debug!("resuming scan: ranking caught up");
            self.gate.resume();
        }
    }

    /// Resets all core state and starts over against `root`.
    fn reset(&mut self, root: PathBuf) {
        log::debug!(
            "session root change: {} -> {}",
            self.root.display(),
            root.display()
        );
        if !self.scan_done {
            self.sink.scan_finished();
        }
        // Wake a producer blocked on the old gate so it can observe the
        // closed channel and stop.
        self.gate.resume();
        self.scheduler.cancel();

        let (scheduler, output_rx) = spawn_scheduler();
        self.scheduler = scheduler;
        self.output_rx = output_rx;

        // Replace the query stream wholesale. A pattern debounced against
        // the old root may still be queued (or in the debounce window); the
        // old receiver is dropped here, so it can never reach the new
        // scheduler.
        let (raw_tx, pattern_rx) = QueryStream::spawn(self.config.debounce);
        *self.input_slot.lock() = raw_tx;
        self.pattern_rx = pattern_rx;

        self.root = root;
        self.accepted_count = 0;
        self.ranked_through = 0;
        let (gate, scan_rx) = start_scan(&self.walker, &self.root, &self.config, &self.sink);
        self.gate = gate;
        self.scan_rx = scan_rx;
        self.scan_done = false;
    }

    fn shutdown(&mut self) {
        if !self.scan_done {
            self.sink.scan_finished();
        }
        self.gate.resume();
        self.scheduler.cancel();
        self.accepted_count = 0;
        self.ranked_through = 0;
        self.sink.publish(Vec::new(), 0);
        log::debug!("session closed");
    }
}

fn spawn_scheduler() -> (FilterScheduler, mpsc::UnboundedReceiver<PassOutput>) {
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    (FilterScheduler::spawn(output_tx), output_rx)
}

fn start_scan(
    walker: &Arc<dyn DirectoryWalker>,
    root: &PathBuf,
    config: &FinderConfig,
    sink: &Arc<dyn ResultsSink>,
) -> (Arc<PauseGate>, mpsc::Receiver<ScanUpdate>) {
    let gate = Arc::new(PauseGate::new());
    let scan_rx = PathScanner::spawn(
        walker.clone(),
        root.clone(),
        gate.clone(),
        config.scan_channel_capacity,
    );
    sink.scan_started();
    (gate, scan_rx)
}
