//! Pause gate for throttling the background scanner.
//!
//! The scanner calls [`PauseGate::wait_until_resumed`] before emitting each
//! batch, so while paused the producer stalls at the source instead of
//! dropping items or buffering without bound. `resume()` wakes exactly one
//! blocked producer.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct PauseGate {
    paused: Mutex<bool>,
    unpaused: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    pub fn resume(&self) {
        let mut paused = self.paused.lock();
        if *paused {
            *paused = false;
            self.unpaused.notify_one();
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// Blocks the calling thread while the gate is paused.
    pub fn wait_until_resumed(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.unpaused.wait(&mut paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn unpaused_gate_does_not_block() {
        let gate = PauseGate::new();
        gate.wait_until_resumed();
        assert!(!gate.is_paused());
    }

    #[test]
    fn paused_producer_blocks_until_resumed() {
        let gate = Arc::new(PauseGate::new());
        let emitted = Arc::new(AtomicUsize::new(0));

        gate.pause();
        let producer = {
            let gate = gate.clone();
            let emitted = emitted.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    gate.wait_until_resumed();
                    emitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(emitted.load(Ordering::SeqCst), 0);

        gate.resume();
        producer.join().expect("producer thread");
        assert_eq!(emitted.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn resume_without_pause_is_a_no_op() {
        let gate = PauseGate::new();
        gate.resume();
        assert!(!gate.is_paused());
    }
}
