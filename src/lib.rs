//! # luamdb - LMDB for Lua hosts, behind opaque handles
//!
//! luamdb exposes a transactional embedded key-value store (LMDB, through
//! `heed`) to a host scripting environment that can only hold integer
//! handles between calls.
//!
//! ## Architecture
//!
//! - **ScopedTxn / ScopedCursor**: transaction and cursor scopes that are
//!   released on every exit path (commit, abort, early return, error)
//! - **Store**: one environment plus one table; `get`, `put`, `remove`,
//!   each scoping its own transaction
//! - **Iteration**: `each` and `reduce` walk the table in key order, calling
//!   back into the host for every record
//! - **HandleRegistry**: maps never-reused integer handles to live stores
//! - **script** (feature `lua`): the `lmdb` Lua module and a script executor
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use luamdb::{HandleRegistry, Options, Store, WriteFlags};
//!
//! # fn main() -> Result<(), luamdb::Error> {
//! let registry = HandleRegistry::new();
//! let handle = registry.register(Store::open("./data", Options::default())?);
//!
//! let store = registry.resolve(handle)?;
//! store.put(b"a", b"1", WriteFlags::default())?;
//! store.put(b"b", b"2", WriteFlags::default())?;
//!
//! let total = store.reduce(0usize, |_key, value, acc| {
//!     Ok::<_, std::convert::Infallible>(acc + value.len())
//! })?;
//! assert_eq!(total, 2);
//!
//! registry.destroy(handle)?;
//! assert!(registry.resolve(handle).is_err());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod cursor;
pub mod error;
pub mod iterator;
pub mod registry;
#[cfg(feature = "lua")]
pub mod script;
pub mod store;
pub mod txn;

// Re-exports
pub use config::{Options, WriteFlags};
pub use cursor::ScopedCursor;
pub use error::{Error, Result};
pub use registry::{Handle, HandleRegistry};
pub use store::Store;
pub use txn::{ScopedTxn, TxnState};
