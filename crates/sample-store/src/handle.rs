//! Table handles.
//!
//! A `TableHandle` is what a single consumer (one connection, one thread)
//! holds while working with a table. It carries the handle's private
//! sampler, so handles are `Send` but are not meant to be shared.

use std::sync::Arc;

use tracing::trace;

use sample_common::{SampleError, SampleResult, Value};

use crate::codec::{self, RowCodec};
use crate::registry::TableRegistry;
use crate::sampler::{Admission, Sampler};
use crate::scan::ScanSession;
use crate::table::Table;

/// An open reference to a registered table.
///
/// Dropping the handle (or calling [`close`](TableHandle::close))
/// unregisters it, which may let a pending drop or rename proceed.
#[derive(Debug)]
pub struct TableHandle {
    /// Owning registry.
    registry: Arc<TableRegistry>,
    /// The open table.
    table: Arc<Table>,
    /// Private admission controller.
    sampler: Sampler,
    /// Codec for the table's width.
    codec: RowCodec,
}

impl TableHandle {
    pub(crate) fn new(registry: Arc<TableRegistry>, table: Arc<Table>, sampler: Sampler) -> Self {
        let codec = RowCodec::new(table.width());
        Self {
            registry,
            table,
            sampler,
            codec,
        }
    }

    /// Returns the open table.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Returns the table's current name.
    pub fn name(&self) -> String {
        self.table.name()
    }

    /// Returns the seed of this handle's sampler.
    pub fn seed(&self) -> u64 {
        self.sampler.seed()
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Offers one row to the sample.
    ///
    /// Returns `Ok` whatever the sampling outcome; the [`Admission`] says
    /// whether the row was stored. Only a wrong field count or a byte value
    /// too long to encode is an error.
    pub fn write_row(&mut self, fields: &[Value]) -> SampleResult<Admission> {
        if fields.len() != self.codec.width() {
            return Err(SampleError::SchemaMismatch {
                expected: self.codec.width(),
                actual: fields.len(),
            });
        }
        if let Some(len) = fields
            .iter()
            .filter_map(Value::as_bytes)
            .map(<[u8]>::len)
            .find(|len| !codec::field_length_fits(*len))
        {
            return Err(SampleError::config(format!(
                "field of {len} bytes exceeds the encodable limit"
            )));
        }

        let codec = self.codec;
        let outcome = self
            .sampler
            .attempt_admit(&self.table, || codec.encode(fields));

        self.registry.stats().record_admission(outcome);
        trace!(?outcome, "write_row");
        Ok(outcome)
    }

    /// Starts a scan over the rows sampled so far.
    ///
    /// The rows are detached from the table on the first call to `next`;
    /// see [`ScanSession`].
    pub fn scan(&self) -> ScanSession<'_> {
        ScanSession::new(&self.table, self.codec, self.registry.stats())
    }

    /// Rows cannot be updated.
    pub fn update_row(&mut self, _old: &[Value], _new: &[Value]) -> SampleResult<()> {
        Err(SampleError::unsupported("update_row"))
    }

    /// Rows cannot be deleted individually.
    pub fn delete_row(&mut self, _row: &[Value]) -> SampleResult<()> {
        Err(SampleError::unsupported("delete_row"))
    }

    /// Tables have no indexes.
    pub fn index_read(&self, _index: usize, _key: &[Value]) -> SampleResult<Vec<Value>> {
        Err(SampleError::unsupported("index_read"))
    }

    /// Rows have no stable position to read back from.
    pub fn read_at(&self, _position: &[u8]) -> SampleResult<Vec<Value>> {
        Err(SampleError::unsupported("read_at"))
    }

    // =========================================================================
    // DDL
    // =========================================================================

    /// Renames the table this handle holds.
    ///
    /// Waits for every other handle to close; this handle is not counted.
    pub fn rename(&self, to: &str) -> SampleResult<bool> {
        let from = self.table.name();
        self.registry.rename_table(&from, to, Some(&self.table))
    }

    /// Closes the handle.
    pub fn close(self) {}
}

impl Drop for TableHandle {
    fn drop(&mut self) {
        self.registry.release(&self.table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_common::SampleConfig;

    fn open(name: &str, width: usize) -> TableHandle {
        let config = SampleConfig::default().with_rate(1).with_limit(3);
        let registry = Arc::new(TableRegistry::new(config).unwrap());
        registry.open(name, width).unwrap()
    }

    #[test]
    fn test_write_row_stores_until_full() {
        let mut handle = open("t", 2);

        for i in 0..3 {
            let outcome = handle.write_row(&[Value::Int(i), Value::from("x")]).unwrap();
            assert_eq!(outcome, Admission::Inserted);
        }
        let outcome = handle.write_row(&[Value::Int(4), Value::from("d")]).unwrap();
        assert_eq!(outcome, Admission::Full);
        assert_eq!(handle.table().len(), 3);
    }

    #[test]
    fn test_write_row_wrong_width() {
        let mut handle = open("t", 2);
        let err = handle.write_row(&[Value::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            SampleError::SchemaMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_write_row_records_stats() {
        let mut handle = open("t", 1);
        for i in 0..5 {
            handle.write_row(&[Value::Int(i)]).unwrap();
        }
        let stats = handle.registry.stats().snapshot();
        assert_eq!(stats.sampled, 5);
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.discarded_full, 2);
    }

    #[test]
    fn test_unsupported_operations() {
        let mut handle = open("t", 1);
        let row = [Value::Int(1)];

        assert!(handle.update_row(&row, &row).unwrap_err().is_unsupported());
        assert!(handle.delete_row(&row).unwrap_err().is_unsupported());
        assert!(handle.index_read(0, &row).unwrap_err().is_unsupported());
        assert!(handle.read_at(&[0, 0]).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_rename_own_table() {
        let handle = open("a", 1);
        assert!(handle.rename("b").unwrap());
        assert_eq!(handle.name(), "b");
        assert!(handle.registry.contains("b"));
        assert!(!handle.registry.contains("a"));
        assert_eq!(handle.table().users(), 1);
    }

    #[test]
    fn test_rename_after_shutdown_leaves_new_table_alone() {
        let old = open("a", 1);
        old.registry.shutdown();

        let mut fresh = old.registry.open("a", 1).unwrap();
        fresh.write_row(&[Value::Int(1)]).unwrap();
        let fresh_table = Arc::clone(fresh.table());
        fresh.close();

        assert!(!old.rename("b").unwrap());
        assert_eq!(fresh_table.name(), "a");
        assert_eq!(fresh_table.len(), 1);
        assert!(old.registry.contains("a"));
        assert!(!old.registry.contains("b"));
    }

    #[test]
    fn test_close_releases_user() {
        let handle = open("t", 1);
        let table = Arc::clone(handle.table());
        assert_eq!(table.users(), 1);
        handle.close();
        assert_eq!(table.users(), 0);
    }
}
