//! Per-table state.
//!
//! A `Table` is owned by the registry and shared with open handles through
//! `Arc`. Its row collection and capacity check are guarded by the table's
//! own mutex. The user count and the dropping/renaming flags are only
//! changed while the registry lock is held; they are atomics so they can be
//! read from anywhere.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use sample_common::{SampleConfig, SampleError, SampleResult};

use crate::codec::EncodedRow;
use crate::rows::RowCollection;
use crate::sampler::Admission;

/// Options used when a table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Declared column count.
    pub width: usize,
    /// Sampling rate; writes are admitted with probability `1 / rate`.
    pub rate: u32,
    /// Maximum rows held between scans.
    pub limit: u32,
}

impl TableOptions {
    /// Creates options with explicit width, rate, and limit.
    pub fn new(width: usize, rate: u32, limit: u32) -> Self {
        Self { width, rate, limit }
    }

    /// Creates options taking rate and limit from the registry config.
    pub fn from_config(width: usize, config: &SampleConfig) -> Self {
        Self::new(width, config.rate, config.limit)
    }

    /// Validates the options for table creation.
    pub fn validate(&self) -> SampleResult<()> {
        if self.width == 0 {
            return Err(SampleError::config("table width must be at least 1"));
        }
        if self.rate == 0 {
            return Err(SampleError::config("sampling rate must be at least 1"));
        }
        if self.limit == 0 {
            return Err(SampleError::config("row limit must be at least 1"));
        }
        Ok(())
    }
}

/// A named sampling table.
#[derive(Debug)]
pub struct Table {
    /// Current name; replaced in place by rename.
    name: RwLock<String>,
    /// Declared column count.
    width: usize,
    /// Sampling rate.
    rate: u32,
    /// Sampled rows.
    rows: Mutex<RowCollection>,
    /// Open handles plus any in-flight drop or rename.
    users: AtomicUsize,
    /// Set once a drop has started.
    dropping: AtomicBool,
    /// Set while a rename waits for quiescence.
    renaming: AtomicBool,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>, options: TableOptions) -> Self {
        Self {
            name: RwLock::new(name.into()),
            width: options.width,
            rate: options.rate,
            rows: Mutex::new(RowCollection::new(options.limit as usize)),
            users: AtomicUsize::new(0),
            dropping: AtomicBool::new(false),
            renaming: AtomicBool::new(false),
        }
    }

    /// Returns the table's current name.
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Returns the declared column count.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the sampling rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Returns the capacity.
    pub fn limit(&self) -> usize {
        self.rows.lock().limit()
    }

    /// Returns the number of rows currently held.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Returns true if no rows are held.
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Returns the number of registered users.
    pub fn users(&self) -> usize {
        self.users.load(Ordering::Acquire)
    }

    /// Returns true once a drop has started.
    pub fn is_dropping(&self) -> bool {
        self.dropping.load(Ordering::Acquire)
    }

    /// Returns true while a rename is waiting for other users to leave.
    pub fn is_renaming(&self) -> bool {
        self.renaming.load(Ordering::Acquire)
    }

    /// Inserts an encoded row without ever blocking.
    ///
    /// If the table mutex is held elsewhere the row is dropped and
    /// [`Admission::Contended`] is returned; if the table is at capacity the
    /// row is dropped and [`Admission::Full`] is returned.
    pub fn try_insert(&self, row: EncodedRow) -> Admission {
        let Some(mut rows) = self.rows.try_lock() else {
            return Admission::Contended;
        };

        match rows.insert_if_capacity(row) {
            Ok(()) => Admission::Inserted,
            Err(_discarded) => Admission::Full,
        }
    }

    /// Detaches the current rows and installs an empty collection.
    ///
    /// This is the only point where a reader synchronizes with writers:
    /// rows inserted before the swap go to the caller, rows inserted after
    /// it stay in the table.
    pub fn swap_rows(&self) -> RowCollection {
        self.rows.lock().take_all_and_replace()
    }

    /// Drops every row currently held.
    pub(crate) fn clear_rows(&self) -> usize {
        self.rows.lock().clear()
    }

    // Registry-lock-only mutators

    pub(crate) fn acquire(&self) {
        self.users.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        self.users.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn set_dropping(&self) {
        self.dropping.store(true, Ordering::Release);
    }

    pub(crate) fn set_renaming(&self, renaming: bool) {
        self.renaming.store(renaming, Ordering::Release);
    }

    pub(crate) fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }
}
