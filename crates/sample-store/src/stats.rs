//! Store statistics for status reporting.
//!
//! Table contents cannot tell a caller how many rows were written, because
//! capacity and contention discards are silent. These counters can.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::sampler::Admission;

/// Process-wide counters shared by every handle of a registry.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Writes the draw admitted, stored or not.
    sampled: AtomicU64,
    /// Writes stored in a table.
    inserted: AtomicU64,
    /// Sampled writes dropped because the table was full.
    discarded_full: AtomicU64,
    /// Sampled writes dropped because the table lock was busy.
    discarded_contended: AtomicU64,
    /// Writes the draw rejected.
    skipped: AtomicU64,
    /// Rows delivered to scan consumers.
    scanned: AtomicU64,
}

impl StoreStats {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one write attempt.
    #[inline]
    pub fn record_admission(&self, outcome: Admission) {
        let counter = match outcome {
            Admission::NotSampled => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Admission::Inserted => &self.inserted,
            Admission::Full => &self.discarded_full,
            Admission::Contended => &self.discarded_contended,
        };
        self.sampled.fetch_add(1, Ordering::Relaxed);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one row delivered by a scan.
    #[inline]
    pub fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns writes admitted by the draw, including those later dropped.
    pub fn sampled(&self) -> u64 {
        self.sampled.load(Ordering::Relaxed)
    }

    /// Returns writes actually stored.
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Returns sampled writes dropped by a full table.
    pub fn discarded_full(&self) -> u64 {
        self.discarded_full.load(Ordering::Relaxed)
    }

    /// Returns sampled writes dropped by lock contention.
    pub fn discarded_contended(&self) -> u64 {
        self.discarded_contended.load(Ordering::Relaxed)
    }

    /// Returns writes rejected by the draw.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Returns rows delivered to scans.
    pub fn scanned(&self) -> u64 {
        self.scanned.load(Ordering::Relaxed)
    }

    /// Returns the total number of write attempts.
    pub fn attempts(&self) -> u64 {
        self.sampled() + self.skipped()
    }

    /// Captures all counters at once.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sampled: self.sampled(),
            inserted: self.inserted(),
            discarded_full: self.discarded_full(),
            discarded_contended: self.discarded_contended(),
            skipped: self.skipped(),
            scanned: self.scanned(),
        }
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.sampled.store(0, Ordering::Relaxed);
        self.inserted.store(0, Ordering::Relaxed);
        self.discarded_full.store(0, Ordering::Relaxed);
        self.discarded_contended.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.scanned.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Writes the draw admitted.
    pub sampled: u64,
    /// Writes stored.
    pub inserted: u64,
    /// Sampled writes dropped by a full table.
    pub discarded_full: u64,
    /// Sampled writes dropped by lock contention.
    pub discarded_contended: u64,
    /// Writes the draw rejected.
    pub skipped: u64,
    /// Rows delivered to scans.
    pub scanned: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.snapshot();
        write!(
            f,
            "StoreStats {{ sampled: {}, inserted: {}, discarded_full: {}, discarded_contended: {}, skipped: {}, scanned: {} }}",
            s.sampled, s.inserted, s.discarded_full, s.discarded_contended, s.skipped, s.scanned
        )
    }
}
