//! Sampling admission control.
//!
//! Each open handle owns a private pseudo-random stream. A write first
//! draws from that stream; only if the draw admits it is the row encoded
//! and offered to the table, which may still drop it when the table is
//! full or its lock is busy. Neither rejection is an error.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sample_common::constants::INITIAL_SEED;

use crate::codec::EncodedRow;
use crate::table::Table;

/// Outcome of one write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// The row was sampled and stored.
    Inserted,
    /// The draw rejected the row; it was never encoded.
    NotSampled,
    /// The row was sampled but the table lock was busy, so it was dropped.
    Contended,
    /// The row was sampled but the table was at capacity, so it was dropped.
    Full,
}

impl Admission {
    /// Returns true if the row ended up in the table.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Admission::Inserted)
    }

    /// Returns true if the draw admitted the row, whether or not it was
    /// then stored.
    pub fn was_sampled(&self) -> bool {
        !matches!(self, Admission::NotSampled)
    }
}

/// Monotonic source of per-handle seeds.
///
/// Every handle draws a distinct seed at open time, so two handles on the
/// same table produce independent streams.
#[derive(Debug)]
pub struct SeedSequence {
    next: Mutex<u64>,
}

impl SeedSequence {
    /// Creates a sequence starting at `first`.
    pub fn new(first: u64) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }

    /// Returns the next seed.
    pub fn next_seed(&self) -> u64 {
        let mut next = self.next.lock();
        let seed = *next;
        *next = next.wrapping_add(1);
        seed
    }
}

impl Default for SeedSequence {
    fn default() -> Self {
        Self::new(INITIAL_SEED)
    }
}

/// Per-handle admission controller.
#[derive(Debug)]
pub struct Sampler {
    /// Private generator.
    rng: StdRng,
    /// Admit one draw in `rate`.
    rate: u32,
    /// Seed the generator started from.
    seed: u64,
}

impl Sampler {
    /// Creates a sampler seeded with `seed`.
    ///
    /// A rate of zero is treated as one.
    pub fn new(seed: u64, rate: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            rate: rate.max(1),
            seed,
        }
    }

    /// Returns the sampling rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Returns the seed this sampler started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws once and returns whether the write should be attempted.
    pub fn draw(&mut self) -> bool {
        self.rng.gen::<u32>() % self.rate == 0
    }

    /// Runs one write attempt against `table`.
    ///
    /// `produce` is only called when the draw admits the write, so rejected
    /// writes never pay for encoding.
    pub fn attempt_admit<F>(&mut self, table: &Table, produce: F) -> Admission
    where
        F: FnOnce() -> EncodedRow,
    {
        if !self.draw() {
            return Admission::NotSampled;
        }
        table.try_insert(produce())
    }
}
