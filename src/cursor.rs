//! Scoped cursors over a store's table.

use heed::types::Bytes;
use heed::{Database, RoIter};

use crate::txn::{ScopedTxn, TxnState};
use crate::{Error, Result};

/// A cursor scope bound to one transaction and one table.
///
/// The borrow of the parent [`ScopedTxn`] guarantees the cursor cannot
/// outlive it. Closing is idempotent and also happens on drop.
pub struct ScopedCursor<'t> {
    iter: Option<RoIter<'t, Bytes, Bytes>>,
}

impl<'t> ScopedCursor<'t> {
    /// Creates a closed cursor.
    pub fn new() -> Self {
        Self { iter: None }
    }

    /// Opens the cursor at the start of `db` within `txn`.
    ///
    /// The transaction must be in [`TxnState::Began`]. A cursor that was
    /// already open is closed first.
    pub fn open(&mut self, txn: &'t ScopedTxn<'_>, db: Database<Bytes, Bytes>) -> Result<()> {
        self.close();

        if txn.state() != TxnState::Began {
            return Err(Error::EngineCursor(format!(
                "transaction is not active (state: {:?})",
                txn.state()
            )));
        }
        let rtxn = txn
            .read_txn()
            .map_err(|e| Error::EngineCursor(e.to_string()))?;
        self.iter = Some(db.iter(rtxn).map_err(Error::engine_cursor)?);
        Ok(())
    }

    /// Advances to the next record in the Engine's key order.
    ///
    /// Returns `Ok(None)` at end-of-table.
    pub fn next_record(&mut self) -> Result<Option<(&'t [u8], &'t [u8])>> {
        let iter = self
            .iter
            .as_mut()
            .ok_or_else(|| Error::EngineCursor("cursor is not open".into()))?;

        match iter.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(Error::engine_read(e)),
            None => Ok(None),
        }
    }

    /// Closes the cursor. Safe to call any number of times.
    pub fn close(&mut self) {
        self.iter = None;
    }

    /// Whether the cursor is open.
    pub fn is_open(&self) -> bool {
        self.iter.is_some()
    }
}

impl Default for ScopedCursor<'_> {
    fn default() -> Self {
        Self::new()
    }
}
