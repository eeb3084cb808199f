//! Latest-wins filter scheduling.
//!
//! A single long-lived worker owns the accumulated item sequence and the
//! current pattern. Every trigger (a new batch or a new pattern) bumps the
//! pass generation *before* it is queued, so an in-flight ranking pass
//! observes that it has been superseded between item evaluations and aborts
//! without publishing. The worker drains all queued triggers before starting
//! a pass, so superseded work is coalesced away rather than executed; at most
//! one pass is ever in flight.
//!
//! Completed passes are not pushed to the presentation sink directly; they
//! flow back to the session, which owns all sink traffic. The worker is
//! serial and its output channel is FIFO, so published result sets are
//! monotonically fresher.

use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::mpsc;

use crate::cancel::{PassTracker, PassToken};
use crate::score;
use crate::types::{FileItem, Pattern, ScoredFileItem};

/// Items evaluated between staleness checks; bounds cancellation latency.
const PASS_CHUNK: usize = 512;

/// A completed, non-superseded ranking pass.
#[derive(Debug)]
pub struct PassOutput {
    pub generation: u64,
    /// Accumulated items covered by the pass.
    pub total: usize,
    /// Matching items, ranked.
    pub results: Vec<ScoredFileItem>,
}

enum FilterTrigger {
    Append(Vec<FileItem>),
    Pattern(Pattern),
}

pub struct FilterScheduler {
    trigger_tx: mpsc::UnboundedSender<(u64, FilterTrigger)>,
    tracker: Arc<PassTracker>,
}

impl FilterScheduler {
    /// Spawns the ranking worker on the blocking pool.
    ///
    /// Completed passes are sent over `output_tx`. Must be called within a
    /// tokio runtime.
    pub fn spawn(output_tx: mpsc::UnboundedSender<PassOutput>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let tracker = Arc::new(PassTracker::new());
        let worker_tracker = tracker.clone();
        tokio::task::spawn_blocking(move || worker(trigger_rx, worker_tracker, output_tx));
        Self {
            trigger_tx,
            tracker,
        }
    }

    /// Appends a newly scanned batch, superseding any in-flight pass.
    pub fn append(&self, batch: Vec<FileItem>) {
        if batch.is_empty() {
            return;
        }
        let generation = self.tracker.bump();
        let _ = self
            .trigger_tx
            .send((generation, FilterTrigger::Append(batch)));
    }

    /// Replaces the current pattern, superseding any in-flight pass.
    pub fn set_pattern(&self, pattern: Pattern) {
        let generation = self.tracker.bump();
        let _ = self
            .trigger_tx
            .send((generation, FilterTrigger::Pattern(pattern)));
    }

    /// Cancels any in-flight pass and prevents already queued triggers from
    /// publishing.
    ///
    /// The bump is not paired with a queued trigger, so every token a queued
    /// trigger could run under is already stale. Used on session teardown;
    /// the worker exits once the scheduler is dropped and its queue drains.
    pub fn cancel(&self) {
        self.tracker.bump();
    }
}

fn worker(
    mut trigger_rx: mpsc::UnboundedReceiver<(u64, FilterTrigger)>,
    tracker: Arc<PassTracker>,
    output_tx: mpsc::UnboundedSender<PassOutput>,
) {
    let mut items: Vec<FileItem> = Vec::new();
    let mut pattern = Pattern::default();

    while let Some((mut generation, first)) = trigger_rx.blocking_recv() {
        apply_trigger(first, &mut items, &mut pattern);
        // Coalesce everything already queued: only the latest state matters.
        while let Ok((next_generation, next)) = trigger_rx.try_recv() {
            generation = generation.max(next_generation);
            apply_trigger(next, &mut items, &mut pattern);
        }

        // The pass runs under the generation of the newest applied trigger.
        // A bump with no matching trigger (cancel) leaves it permanently
        // stale; a bump with a queued trigger supersedes it until that
        // trigger's own pass runs.
        let token = PassToken::new(tracker.clone(), generation);
        let Some(results) = run_pass(&items, &pattern, &token) else {
            log::debug!("ranking pass superseded at generation {generation}");
            continue;
        };
        if !token.is_current() {
            log::debug!("ranking pass superseded before publish at generation {generation}");
            continue;
        }

        let output = PassOutput {
            generation,
            total: items.len(),
            results,
        };
        if output_tx.send(output).is_err() {
            break;
        }
    }
}

fn apply_trigger(trigger: FilterTrigger, items: &mut Vec<FileItem>, pattern: &mut Pattern) {
    match trigger {
        FilterTrigger::Append(mut batch) => items.append(&mut batch),
        FilterTrigger::Pattern(next) => *pattern = next,
    }
}

/// Runs one complete ranking pass over the full accumulated sequence.
///
/// Returns `None` when the pass was superseded mid-flight; a superseded pass
/// has no side effects. The per-chunk staleness check bounds cancellation
/// latency by item-processing granularity.
fn run_pass(
    items: &[FileItem],
    pattern: &Pattern,
    token: &PassToken,
) -> Option<Vec<ScoredFileItem>> {
    if pattern.is_empty() {
        // Unfiltered listing in scan order: no scoring, no sorting.
        let mut out = Vec::with_capacity(items.len());
        for chunk in items.chunks(PASS_CHUNK) {
            token.check()?;
            out.extend(chunk.iter().cloned().map(ScoredFileItem::unscored));
        }
        return Some(out);
    }

    let scored: Option<Vec<Vec<ScoredFileItem>>> = items
        .par_chunks(PASS_CHUNK)
        .map(|chunk| {
            token.check()?;
            Some(
                chunk
                    .iter()
                    .filter_map(|item| score::score_item(pattern, item))
                    .collect(),
            )
        })
        .collect();

    let mut ranked: Vec<ScoredFileItem> = scored?.into_iter().flatten().collect();
    token.check()?;
    ranked.sort_unstable_by(score::rank_order);
    Some(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn items(relatives: &[&str]) -> Vec<FileItem> {
        relatives
            .iter()
            .map(|rel| FileItem::new(PathBuf::from("/root").join(rel), Path::new("/root")))
            .collect()
    }

    fn noop_token() -> PassToken {
        let tracker = Arc::new(PassTracker::new());
        PassToken::new(tracker, 0)
    }

    #[test]
    fn pass_over_empty_pattern_preserves_scan_order() {
        let items = items(&["z.txt", "a.txt", "m/q.txt"]);
        let ranked = run_pass(&items, &Pattern::default(), &noop_token()).expect("pass");
        let order: Vec<_> = ranked.iter().map(|s| s.item.relative()).collect();
        assert_eq!(order, vec!["z.txt", "a.txt", "m/q.txt"]);
        assert!(ranked.iter().all(|s| s.highlights.is_empty()));
    }

    #[test]
    fn pass_filters_and_ranks_matches() {
        let items = items(&["a/b/foo.txt", "a/bar.txt", "c/foo2.txt"]);
        let ranked = run_pass(&items, &Pattern::new("foo"), &noop_token()).expect("pass");
        let order: Vec<_> = ranked.iter().map(|s| s.item.relative()).collect();
        assert_eq!(order, vec!["c/foo2.txt", "a/b/foo.txt"]);
    }

    #[test]
    fn pass_with_no_matches_is_empty_not_an_error() {
        let items = items(&["a.txt", "b.txt"]);
        let ranked = run_pass(&items, &Pattern::new("zzz"), &noop_token()).expect("pass");
        assert!(ranked.is_empty());
    }

    #[test]
    fn pass_is_deterministic() {
        let items = items(&["a/b/foo.txt", "c/foo2.txt", "deep/nested/food.rs", "x/y/z.c"]);
        let first = run_pass(&items, &Pattern::new("fo"), &noop_token()).expect("pass");
        let second = run_pass(&items, &Pattern::new("fo"), &noop_token()).expect("pass");
        assert_eq!(first, second);
    }

    #[test]
    fn superseded_pass_yields_nothing() {
        let tracker = Arc::new(PassTracker::new());
        let stale = PassToken::new(tracker.clone(), tracker.bump());
        tracker.bump();

        let items = items(&["a/b/foo.txt"]);
        assert!(run_pass(&items, &Pattern::new("foo"), &stale).is_none());
        assert!(run_pass(&items, &Pattern::default(), &stale).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn worker_converges_on_the_latest_state() {
        let (output_tx, mut output_rx) = mpsc::unbounded_channel();
        let scheduler = FilterScheduler::spawn(output_tx);

        scheduler.append(items(&["a/b/foo.txt", "a/bar.txt"]));
        scheduler.append(items(&["c/foo2.txt"]));
        scheduler.set_pattern(Pattern::new("bogus"));
        scheduler.set_pattern(Pattern::new("foo"));

        // The worker may coalesce aggressively, but the final published pass
        // must reflect all four triggers.
        let mut outputs = Vec::new();
        loop {
            let output = tokio::time::timeout(Duration::from_secs(5), output_rx.recv())
                .await
                .expect("pass output in time")
                .expect("worker alive");
            let done = output.total == 3 && output.results.len() == 2;
            outputs.push(output);
            if done {
                break;
            }
        }

        let last = outputs.last().expect("output");
        let order: Vec<_> = last.results.iter().map(|s| s.item.relative()).collect();
        assert_eq!(order, vec!["c/foo2.txt", "a/b/foo.txt"]);

        // Outputs never go backwards: generations and totals are increasing.
        assert!(outputs.windows(2).all(|w| w[0].generation < w[1].generation));
        assert!(outputs.windows(2).all(|w| w[0].total <= w[1].total));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancel_prevents_further_output() {
        let (output_tx, mut output_rx) = mpsc::unbounded_channel();
        let scheduler = FilterScheduler::spawn(output_tx);

        scheduler.append(items(&["a.txt"]));
        scheduler.cancel();
        drop(scheduler);

        // The queued trigger runs with a stale token and must not publish;
        // the worker then exits and the channel closes.
        assert!(output_rx.recv().await.is_none());
    }
}
