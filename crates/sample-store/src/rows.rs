//! Bounded row collection.
//!
//! A table's rows live in a `RowCollection` guarded by the table's mutex.
//! The collection itself does no locking; it only enforces the capacity
//! and supports the detach-and-replace swap scans rely on.

use crate::codec::EncodedRow;

/// An unordered, capacity-bounded set of encoded rows.
///
/// Consumers must not assume any temporal order. [`remove_one`] hands back
/// the most recently inserted row.
///
/// [`remove_one`]: RowCollection::remove_one
#[derive(Debug, Default)]
pub struct RowCollection {
    /// Stored rows.
    rows: Vec<EncodedRow>,
    /// Maximum number of rows.
    limit: usize,
}

impl RowCollection {
    /// Creates an empty collection holding at most `limit` rows.
    pub fn new(limit: usize) -> Self {
        Self {
            rows: Vec::new(),
            limit,
        }
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the capacity.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true if no further row fits.
    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.limit
    }

    /// Inserts `row` if the collection is below capacity.
    ///
    /// On a full collection the row is handed back so the caller can
    /// reclaim it.
    pub fn insert_if_capacity(&mut self, row: EncodedRow) -> Result<(), EncodedRow> {
        if self.is_full() {
            return Err(row);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Detaches every stored row, leaving an empty collection with the same
    /// capacity in place.
    pub fn take_all_and_replace(&mut self) -> RowCollection {
        let limit = self.limit;
        std::mem::replace(self, RowCollection::new(limit))
    }

    /// Removes and returns one row, or `None` when empty.
    pub fn remove_one(&mut self) -> Option<EncodedRow> {
        self.rows.pop()
    }

    /// Drops every stored row, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.rows.len();
        self.rows.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RowCodec;
    use sample_common::Value;

    fn row(v: i64) -> EncodedRow {
        RowCodec::new(1).encode(&[Value::Int(v)])
    }

    #[test]
    fn test_insert_until_full() {
        let mut rows = RowCollection::new(2);

        assert!(rows.insert_if_capacity(row(1)).is_ok());
        assert!(rows.insert_if_capacity(row(2)).is_ok());
        assert!(rows.is_full());

        let rejected = rows.insert_if_capacity(row(3)).unwrap_err();
        assert_eq!(rejected, row(3));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let mut rows = RowCollection::new(0);
        assert!(rows.insert_if_capacity(row(1)).is_err());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_remove_one_is_most_recent() {
        let mut rows = RowCollection::new(3);
        rows.insert_if_capacity(row(1)).unwrap();
        rows.insert_if_capacity(row(2)).unwrap();

        assert_eq!(rows.remove_one(), Some(row(2)));
        assert_eq!(rows.remove_one(), Some(row(1)));
        assert_eq!(rows.remove_one(), None);
    }

    #[test]
    fn test_take_all_and_replace() {
        let mut rows = RowCollection::new(5);
        rows.insert_if_capacity(row(1)).unwrap();
        rows.insert_if_capacity(row(2)).unwrap();

        let taken = rows.take_all_and_replace();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.limit(), 5);
        assert!(rows.is_empty());
        assert_eq!(rows.limit(), 5);

        // The fresh collection has its full capacity available again.
        for v in 0..5 {
            rows.insert_if_capacity(row(v)).unwrap();
        }
        assert!(rows.is_full());
    }

    #[test]
    fn test_clear() {
        let mut rows = RowCollection::new(4);
        rows.insert_if_capacity(row(1)).unwrap();
        rows.insert_if_capacity(row(2)).unwrap();

        assert_eq!(rows.clear(), 2);
        assert!(rows.is_empty());
    }
}
