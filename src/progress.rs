//! Progress tracking for counting runs.
//!
//! Workers record each sequence they finish; callers observe snapshots
//! through a callback.
//!
//! # Example
//!
//! ```rust,no_run
//! use kfcount::builder::CounterBuilder;
//!
//! let counts = CounterBuilder::new()
//!     .k(21)?
//!     .count_with_progress(["genome.fa"], |progress| {
//!         eprintln!(
//!             "{} sequences, {} bases",
//!             progress.sequences_processed, progress.bases_processed
//!         );
//!     })?;
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Progress snapshot during counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Number of sequences processed so far.
    pub sequences_processed: u64,
    /// Total number of bases processed so far.
    pub bases_processed: u64,
}

/// Thread-safe progress counters.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    sequences: AtomicU64,
    bases: AtomicU64,
}

impl ProgressTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequences: AtomicU64::new(0),
            bases: AtomicU64::new(0),
        }
    }

    /// Records one processed sequence of `bases` bases and returns the
    /// progress including it.
    pub fn record_sequence(&self, bases: u64) -> Progress {
        Progress {
            sequences_processed: self.sequences.fetch_add(1, Ordering::Relaxed) + 1,
            bases_processed: self.bases.fetch_add(bases, Ordering::Relaxed) + bases,
        }
    }

    /// Current progress. Other threads may update it immediately after.
    pub fn snapshot(&self) -> Progress {
        Progress {
            sequences_processed: self.sequences.load(Ordering::Relaxed),
            bases_processed: self.bases.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_starts_at_zero() {
        assert_eq!(ProgressTracker::new().snapshot(), Progress::default());
    }

    #[test]
    fn tracker_records_sequences() {
        let tracker = ProgressTracker::new();
        tracker.record_sequence(100);
        let progress = tracker.record_sequence(50);
        assert_eq!(progress.sequences_processed, 2);
        assert_eq!(progress.bases_processed, 150);
        assert_eq!(tracker.snapshot(), progress);
    }

    #[test]
    fn tracker_is_shared_across_threads() {
        let tracker = ProgressTracker::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..250 {
                        tracker.record_sequence(2);
                    }
                });
            }
        });
        let progress = tracker.snapshot();
        assert_eq!(progress.sequences_processed, 1000);
        assert_eq!(progress.bases_processed, 2000);
    }
}
