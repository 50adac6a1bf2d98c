//! Progress tracking readable from any thread while a dispatch is running.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Shared counters updated by workers as candidates are evaluated.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    total: AtomicUsize,
    processed: AtomicUsize,
    accepted: AtomicUsize,
    data_rejections: AtomicUsize,
    vetoes: AtomicUsize,
}

/// Point-in-time copy of the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub accepted: usize,
    pub data_rejections: usize,
    pub vetoes: usize,
}

impl ProgressSnapshot {
    /// Fraction processed in `[0, 1]`; an empty run counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and set the expected total.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.accepted.store(0, Ordering::Relaxed);
        self.data_rejections.store(0, Ordering::Relaxed);
        self.vetoes.store(0, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_data_rejection(&self) {
        self.data_rejections.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_veto(&self) {
        self.vetoes.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Candidates dropped wholesale by a batch factor.
    pub fn record_dropped(&self, n: usize) {
        self.vetoes.fetch_add(n, Ordering::Relaxed);
        self.processed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            data_rejections: self.data_rejections.load(Ordering::Relaxed),
            vetoes: self.vetoes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let p = ProgressTracker::new();
        p.reset(5);
        p.record_accepted();
        p.record_veto();
        p.record_data_rejection();
        p.record_dropped(2);

        let snap = p.snapshot();
        assert_eq!(snap.processed, 5);
        assert_eq!(snap.vetoes, 3);
        assert_eq!(snap.fraction(), 1.0);

        p.reset(10);
        assert_eq!(p.snapshot(), ProgressSnapshot { total: 10, ..Default::default() });
    }

    #[test]
    fn tracker_is_shared_across_threads() {
        let p = ProgressTracker::new();
        p.reset(400);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| (0..100).for_each(|_| p.record_accepted()));
            }
        });
        assert_eq!(p.snapshot().accepted, 400);
    }
}
