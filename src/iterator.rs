//! Full-table traversal driven by host callbacks.
//!
//! Both operations hold one read-only transaction and one cursor open for
//! the whole call and hand every record to the callback synchronously, in
//! the Engine's key order. Records are visited one at a time, left to right;
//! a fold is never reordered or batched.

use std::fmt;

use crate::cursor::ScopedCursor;
use crate::store::{Opened, Store};
use crate::txn::ScopedTxn;
use crate::{Error, Result};

impl Store {
    /// Calls `visitor(key, value)` once per record, in key order.
    ///
    /// The first callback failure stops the traversal and is returned as
    /// [`Error::Callback`]; an Engine failure mid-traversal is returned as
    /// [`Error::EngineRead`]. The transaction and cursor are released
    /// before this returns, on every path.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use luamdb::{Options, Store, WriteFlags};
    ///
    /// # fn main() -> Result<(), luamdb::Error> {
    /// let store = Store::open("./data", Options::default())?;
    /// store.put(b"a", b"1", WriteFlags::default())?;
    /// store.put(b"b", b"2", WriteFlags::default())?;
    ///
    /// let mut keys = Vec::new();
    /// store.each(|key, _value| {
    ///     keys.push(key.to_vec());
    ///     Ok::<(), std::convert::Infallible>(())
    /// })?;
    /// assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn each<F, E>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> std::result::Result<(), E>,
        E: fmt::Display,
    {
        self.fold((), |key, value, ()| visitor(key, value).map_err(Error::callback))
    }

    /// Folds every record into an accumulator, in key order.
    ///
    /// Computes `folder(kn, vn, ... folder(k1, v1, initial) ...)`. The
    /// accumulator is moved into each call and the returned value replaces
    /// it; an empty table returns `initial` untouched. No partial result is
    /// returned on failure.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use luamdb::{Options, Store, WriteFlags};
    ///
    /// # fn main() -> Result<(), luamdb::Error> {
    /// let store = Store::open("./data", Options::default())?;
    /// store.put(b"a", b"1", WriteFlags::default())?;
    /// store.put(b"b", b"2", WriteFlags::default())?;
    ///
    /// let joined = store.reduce(String::new(), |_key, value, mut acc| {
    ///     acc.push_str(std::str::from_utf8(value).map_err(|e| e.to_string())?);
    ///     Ok::<_, String>(acc)
    /// })?;
    /// assert_eq!(joined, "12");
    /// # Ok(())
    /// # }
    /// ```
    pub fn reduce<A, F, E>(&self, initial: A, mut folder: F) -> Result<A>
    where
        F: FnMut(&[u8], &[u8], A) -> std::result::Result<A, E>,
        E: fmt::Display,
    {
        self.fold(initial, |key, value, acc| {
            folder(key, value, acc).map_err(Error::callback)
        })
    }

    /// Shared traversal loop for `each` and `reduce`.
    fn fold<A, F>(&self, initial: A, mut step: F) -> Result<A>
    where
        F: FnMut(&[u8], &[u8], A) -> Result<A>,
    {
        let Opened { env, db } = self.opened()?;
        let mut txn = ScopedTxn::new(&env);
        txn.begin(true)?;

        let mut acc = initial;
        {
            let mut cursor = ScopedCursor::new();
            cursor.open(&txn, db)?;
            while let Some((key, value)) = cursor.next_record()? {
                acc = step(key, value, acc)?;
            }
            cursor.close();
        }

        txn.commit()?;
        Ok(acc)
    }
}
