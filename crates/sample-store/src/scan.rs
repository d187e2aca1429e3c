//! Scan sessions.
//!
//! A scan drains a consistent batch of sampled rows while writers keep
//! going. On the first row request the session swaps the table's live
//! collection for an empty one under the table mutex. After that, writers
//! fill the new collection and the session drains its private snapshot
//! without any further locking.
//!
//! A session is single-pass: once its snapshot is exhausted it keeps
//! returning `None`, and rows admitted after the swap are only visible to a
//! new session. Rows left undelivered are discarded with the session.

use tracing::{debug, error};

use sample_common::{SampleResult, Value};

use crate::codec::RowCodec;
use crate::rows::RowCollection;
use crate::stats::StoreStats;
use crate::table::Table;

/// One read pass over a table's sampled rows.
///
/// Iterating yields each captured row exactly once, decoded into values.
/// Row order is unspecified.
#[derive(Debug)]
pub struct ScanSession<'a> {
    /// Table being scanned.
    table: &'a Table,
    /// Codec for the table's width.
    codec: RowCodec,
    /// Reporting counters.
    stats: &'a StoreStats,
    /// Rows detached at the first request; `None` until then.
    snapshot: Option<RowCollection>,
    /// Rows handed out so far.
    delivered: usize,
}

impl<'a> ScanSession<'a> {
    pub(crate) fn new(table: &'a Table, codec: RowCodec, stats: &'a StoreStats) -> Self {
        Self {
            table,
            codec,
            stats,
            snapshot: None,
            delivered: 0,
        }
    }

    /// Returns true once the session has swapped out the table's rows.
    pub fn is_started(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Returns the number of undelivered rows, or `None` before the swap.
    pub fn remaining(&self) -> Option<usize> {
        self.snapshot.as_ref().map(RowCollection::len)
    }

    /// Returns the number of rows delivered so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Returns the next row, or `None` when the snapshot is exhausted.
    ///
    /// A format error means the row buffer is corrupted; the row is
    /// discarded and the error is fatal (see `SampleError::is_fatal`).
    pub fn next_row(&mut self) -> SampleResult<Option<Vec<Value>>> {
        let table = self.table;
        let snapshot = self.snapshot.get_or_insert_with(|| {
            let rows = table.swap_rows();
            debug!(table = %table.name(), rows = rows.len(), "swapped out sampled rows");
            rows
        });

        let Some(row) = snapshot.remove_one() else {
            return Ok(None);
        };

        match self.codec.decode(&row) {
            Ok(values) => {
                self.delivered += 1;
                self.stats.record_scanned();
                Ok(Some(values))
            }
            Err(e) => {
                error!(table = %table.name(), error = %e, "corrupted sampled row");
                Err(e)
            }
        }
    }

    /// Ends the session, discarding undelivered rows.
    ///
    /// Returns how many rows were discarded.
    pub fn finish(mut self) -> usize {
        let discarded = self.snapshot.take().map_or(0, |mut rows| rows.clear());
        if discarded > 0 {
            debug!(table = %self.table.name(), discarded, "scan ended early");
        }
        discarded
    }
}

impl Iterator for ScanSession<'_> {
    type Item = SampleResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EncodedRow;
    use crate::sampler::Admission;
    use crate::table::TableOptions;
    use bytes::Bytes;

    fn table_with(values: &[i64]) -> Table {
        let table = Table::new("t", TableOptions::new(1, 1, 100));
        let codec = RowCodec::new(1);
        for v in values {
            assert_eq!(table.try_insert(codec.encode(&[Value::Int(*v)])), Admission::Inserted);
        }
        table
    }

    fn drain(session: ScanSession<'_>) -> Vec<i64> {
        let mut out: Vec<i64> = session
            .map(|r| r.unwrap()[0].as_int().unwrap())
            .collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_scan_empty_table() {
        let table = table_with(&[]);
        let stats = StoreStats::new();
        let mut session = ScanSession::new(&table, RowCodec::new(1), &stats);

        assert!(session.next_row().unwrap().is_none());
        assert!(session.is_started());
    }

    #[test]
    fn test_scan_delivers_each_row_once() {
        let table = table_with(&[1, 2, 3]);
        let stats = StoreStats::new();

        let session = ScanSession::new(&table, RowCodec::new(1), &stats);
        assert_eq!(drain(session), vec![1, 2, 3]);
        assert_eq!(stats.scanned(), 3);

        let again = ScanSession::new(&table, RowCodec::new(1), &stats);
        assert!(drain(again).is_empty());
    }

    #[test]
    fn test_swap_is_lazy() {
        let table = table_with(&[1]);
        let stats = StoreStats::new();
        let session = ScanSession::new(&table, RowCodec::new(1), &stats);

        assert!(!session.is_started());
        assert_eq!(session.remaining(), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rows_after_swap_go_to_next_session() {
        let table = table_with(&[1, 2]);
        let stats = StoreStats::new();
        let codec = RowCodec::new(1);

        let mut session = ScanSession::new(&table, codec, &stats);
        let first = session.next_row().unwrap().unwrap();
        assert_eq!(session.remaining(), Some(1));

        table.try_insert(codec.encode(&[Value::Int(3)]));
        let rest: Vec<_> = session.by_ref().collect();
        assert_eq!(rest.len(), 1);
        assert_ne!(first, rest[0].as_ref().unwrap().clone());

        // Not restartable: exhausted sessions never swap again.
        assert!(session.next_row().unwrap().is_none());
        assert_eq!(table.len(), 1);

        let next = ScanSession::new(&table, codec, &stats);
        assert_eq!(drain(next), vec![3]);
    }

    #[test]
    fn test_finish_discards_leftovers() {
        let table = table_with(&[1, 2, 3]);
        let stats = StoreStats::new();
        let mut session = ScanSession::new(&table, RowCodec::new(1), &stats);

        session.next_row().unwrap();
        assert_eq!(session.delivered(), 1);
        assert_eq!(session.finish(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_finish_before_start() {
        let table = table_with(&[1]);
        let stats = StoreStats::new();
        let session = ScanSession::new(&table, RowCodec::new(1), &stats);

        assert_eq!(session.finish(), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_corrupted_row_is_fatal() {
        let table = Table::new("t", TableOptions::new(2, 1, 10));
        let short = EncodedRow::from_bytes(Bytes::from_static(&[2, 1]));
        table.try_insert(short);

        let stats = StoreStats::new();
        let mut session = ScanSession::new(&table, RowCodec::new(2), &stats);
        let err = session.next_row().unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(stats.scanned(), 0);
        assert!(session.next_row().unwrap().is_none());
    }
}
