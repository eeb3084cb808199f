//! Debounced query stream.
//!
//! Turns raw text-change events into a sequence of normalized patterns:
//! emissions are separated by a quiet period (only the value present after
//! the quiet period is emitted) and consecutive duplicates are suppressed
//! after normalization. The stream stops permanently when its input closes;
//! a new session starts a fresh stream.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::types::Pattern;

pub struct QueryStream;

impl QueryStream {
    /// Spawns the debounce task.
    ///
    /// Returns the sender for raw text-change events and the receiver of
    /// debounced patterns. Must be called within a tokio runtime.
    pub fn spawn(
        quiet_period: Duration,
    ) -> (mpsc::UnboundedSender<String>, mpsc::UnboundedReceiver<Pattern>) {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<String>();
        let (pattern_tx, pattern_rx) = mpsc::unbounded_channel::<Pattern>();

        tokio::spawn(async move {
            let mut last_emitted: Option<Pattern> = None;
            let mut input_closed = false;

            while !input_closed {
                let Some(mut latest) = raw_rx.recv().await else {
                    break;
                };
                // Absorb further events until the input goes quiet.
                loop {
                    match timeout(quiet_period, raw_rx.recv()).await {
                        Ok(Some(next)) => latest = next,
                        Ok(None) => {
                            input_closed = true;
                            break;
                        }
                        Err(_elapsed) => break,
                    }
                }

                let pattern = Pattern::new(&latest);
                if last_emitted.as_ref() != Some(&pattern) {
                    if pattern_tx.send(pattern.clone()).is_err() {
                        return;
                    }
                    last_emitted = Some(pattern);
                }
            }
        });

        (raw_tx, pattern_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(30);

    #[tokio::test]
    async fn rapid_events_collapse_to_the_final_value() {
        let (raw_tx, mut patterns) = QueryStream::spawn(QUIET);
        raw_tx.send("f".to_string()).expect("send");
        raw_tx.send("fo".to_string()).expect("send");
        raw_tx.send("foo".to_string()).expect("send");

        let first = patterns.recv().await.expect("pattern");
        assert_eq!(first.as_str(), "foo");

        // Nothing else pending.
        let next = timeout(QUIET * 3, patterns.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn consecutive_duplicates_are_suppressed() {
        let (raw_tx, mut patterns) = QueryStream::spawn(QUIET);
        raw_tx.send("foo".to_string()).expect("send");
        assert_eq!(patterns.recv().await.expect("pattern").as_str(), "foo");

        tokio::time::sleep(QUIET * 2).await;
        raw_tx.send("foo".to_string()).expect("send");
        let dup = timeout(QUIET * 3, patterns.recv()).await;
        assert!(dup.is_err());

        raw_tx.send("bar".to_string()).expect("send");
        assert_eq!(patterns.recv().await.expect("pattern").as_str(), "bar");
    }

    #[tokio::test]
    async fn values_are_normalized_before_dedup() {
        let (raw_tx, mut patterns) = QueryStream::spawn(QUIET);
        raw_tx.send("  foo ".to_string()).expect("send");
        assert_eq!(patterns.recv().await.expect("pattern").as_str(), "foo");

        tokio::time::sleep(QUIET * 2).await;
        raw_tx.send("foo".to_string()).expect("send");
        let dup = timeout(QUIET * 3, patterns.recv()).await;
        assert!(dup.is_err(), "trimmed duplicate must be suppressed");
    }

    #[tokio::test]
    async fn stream_ends_when_input_closes() {
        let (raw_tx, mut patterns) = QueryStream::spawn(QUIET);
        raw_tx.send("foo".to_string()).expect("send");
        drop(raw_tx);

        assert_eq!(patterns.recv().await.expect("pattern").as_str(), "foo");
        assert!(patterns.recv().await.is_none());
    }
}
