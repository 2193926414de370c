//! Scoped transactions.
//!
//! A [`ScopedTxn`] owns at most one live Engine transaction. Exactly one
//! terminal action is ever applied to it: an explicit commit or abort, or an
//! implicit abort when the scope is dropped.

use heed::{Env, RoTxn, RwTxn};

use crate::{Error, Result};

/// Lifecycle of a scoped transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// No transaction has been started (or the last begin failed).
    Created,
    /// A transaction is live.
    Began,
    /// The transaction was committed.
    Committed,
    /// The transaction was aborted.
    Aborted,
}

enum LiveTxn<'e> {
    Read(RoTxn<'e>),
    Write(RwTxn<'e>),
}

/// A transaction scope bound to one environment.
///
/// The scope may be reused for sequential `begin` calls, but never holds two
/// live transactions: `begin` aborts whatever is still live first.
///
/// # Example
///
/// ```rust,no_run
/// use luamdb::{Options, Store, ScopedTxn};
///
/// # fn main() -> Result<(), luamdb::Error> {
/// let store = Store::open("./data", Options::default())?;
/// store.with_env(|env, db| {
///     let mut txn = ScopedTxn::new(env);
///     txn.begin(false)?;
///     db.put(txn.write_txn()?, b"key", b"value")
///         .map_err(|e| luamdb::Error::EngineWrite(e.to_string()))?;
///     txn.commit()
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct ScopedTxn<'e> {
    env: &'e Env,
    live: Option<LiveTxn<'e>>,
    state: TxnState,
}

impl<'e> ScopedTxn<'e> {
    /// Creates an empty scope; no Engine transaction is started yet.
    pub fn new(env: &'e Env) -> Self {
        Self {
            env,
            live: None,
            state: TxnState::Created,
        }
    }

    /// Starts a read-only or read-write transaction.
    ///
    /// Any transaction still live in this scope is aborted first. On failure
    /// the scope is left in [`TxnState::Created`].
    pub fn begin(&mut self, read_only: bool) -> Result<()> {
        self.abort();

        let started = if read_only {
            self.env.read_txn().map(LiveTxn::Read)
        } else {
            self.env.write_txn().map(LiveTxn::Write)
        };

        match started {
            Ok(live) => {
                self.live = Some(live);
                self.state = TxnState::Began;
                Ok(())
            }
            Err(e) => {
                self.state = TxnState::Created;
                Err(Error::engine_txn(e))
            }
        }
    }

    /// Commits the live transaction. A no-op when nothing is live.
    ///
    /// For read-only transactions this is a clean release, which also keeps
    /// table handles opened inside it valid.
    pub fn commit(&mut self) -> Result<()> {
        let result = match self.live.take() {
            Some(LiveTxn::Read(txn)) => txn.commit(),
            Some(LiveTxn::Write(txn)) => txn.commit(),
            None => return Ok(()),
        };

        match result {
            Ok(()) => {
                self.state = TxnState::Committed;
                Ok(())
            }
            Err(e) => {
                // The Engine frees the transaction even when commit fails.
                self.state = TxnState::Aborted;
                Err(Error::engine_txn(e))
            }
        }
    }

    /// Aborts the live transaction. A no-op when nothing is live.
    pub fn abort(&mut self) {
        match self.live.take() {
            Some(LiveTxn::Read(txn)) => drop(txn),
            Some(LiveTxn::Write(txn)) => txn.abort(),
            None => return,
        }
        self.state = TxnState::Aborted;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Whether the live transaction is read-only. `None` when nothing is live.
    pub fn is_read_only(&self) -> Option<bool> {
        match self.live {
            Some(LiveTxn::Read(_)) => Some(true),
            Some(LiveTxn::Write(_)) => Some(false),
            None => None,
        }
    }

    /// Borrows the live transaction for reading. Write transactions can read too.
    pub fn read_txn(&self) -> Result<&RoTxn<'e>> {
        match &self.live {
            Some(LiveTxn::Read(txn)) => Ok(txn),
            Some(LiveTxn::Write(txn)) => Ok(&**txn),
            None => Err(Error::EngineTxn(format!(
                "no live transaction (state: {:?})",
                self.state
            ))),
        }
    }

    /// Borrows the live transaction for writing.
    pub fn write_txn(&mut self) -> Result<&mut RwTxn<'e>> {
        match &mut self.live {
            Some(LiveTxn::Write(txn)) => Ok(txn),
            Some(LiveTxn::Read(_)) => Err(Error::EngineTxn("transaction is read-only".into())),
            None => Err(Error::EngineTxn(format!(
                "no live transaction (state: {:?})",
                self.state
            ))),
        }
    }
}

impl Drop for ScopedTxn<'_> {
    fn drop(&mut self) {
        self.abort();
    }
}
