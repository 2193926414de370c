//! The store: one Engine environment plus its single table.
//!
//! Every primitive scopes its own transaction, so nothing is left open
//! between calls from the host.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use parking_lot::{Mutex, RwLock};

use crate::config::{Options, WriteFlags};
use crate::txn::ScopedTxn;
use crate::{Error, Result};

/// Engine status text for a delete of a missing key.
const NOT_FOUND_TEXT: &str = "MDB_NOTFOUND: No matching key/data pair found";

/// Engine status text for a no-overwrite write of an existing key.
const KEY_EXISTS_TEXT: &str = "MDB_KEYEXIST: Key/data pair already exists";

/// Canonical paths of the environments owned by a live store in this
/// process. At most one store owns an environment at a time.
static LIVE_ENVS: Mutex<BTreeSet<PathBuf>> = parking_lot::const_mutex(BTreeSet::new());

/// Environment and table handle. The table handle is only meaningful while
/// this environment is open.
#[derive(Clone)]
pub(crate) struct Opened {
    pub(crate) env: Env,
    pub(crate) db: Database<Bytes, Bytes>,
}

/// An opened environment with one table.
///
/// # Thread Safety
///
/// `Store` is `Send + Sync`. The Engine serializes writers and allows
/// concurrent readers; each operation works on its own clone of the
/// environment handle, so `close` never tears the environment down under an
/// operation that is still running.
///
/// # Example
///
/// ```rust,no_run
/// use luamdb::{Options, Store, WriteFlags};
///
/// # fn main() -> Result<(), luamdb::Error> {
/// let store = Store::open("./data", Options::default())?;
///
/// store.put(b"key1", b"value1", WriteFlags::default())?;
/// assert_eq!(store.get(b"key1")?, Some(b"value1".to_vec()));
///
/// store.remove(b"key1")?;
/// assert_eq!(store.get(b"key1")?, None);
///
/// store.close();
/// # Ok(())
/// # }
/// ```
pub struct Store {
    /// Environment path as given to `open`
    path: PathBuf,

    /// Options the store was opened with
    options: Options,

    /// None once closed
    state: RwLock<Option<Opened>>,
}

impl Store {
    /// Opens (or creates) a store at `path`.
    ///
    /// Applies the map size, opens the environment with the configured
    /// flags, then opens or creates the table inside one setup transaction.
    /// For read-only environments that transaction is itself read-only, so
    /// the table must already exist.
    ///
    /// # Errors
    ///
    /// Any Engine failure is reported as [`Error::EngineOpen`] with the
    /// Engine's message. No store is returned in that case, and a directory
    /// created by this call is removed again.
    ///
    /// An environment already owned by another live store in this process
    /// is refused with [`Error::EngineOpen`]; close that store first.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        options.validate()?;

        let created_dir = !options.no_sub_dir && !options.read_only && !path.exists();
        if created_dir {
            fs::create_dir_all(&path).map_err(|e| Error::EngineOpen(e.to_string()))?;
        }

        let opened = match open_env(&path, &options) {
            Ok(opened) => opened,
            Err(err) => {
                if created_dir {
                    if let Err(e) = fs::remove_dir_all(&path) {
                        log::warn!("Failed to remove {:?} after a failed open: {}", path, e);
                    }
                }
                return Err(err);
            }
        };

        log::debug!(
            "Opened store at {:?} (map size {} bytes, read-only: {})",
            path,
            options.effective_map_size()?,
            options.read_only
        );

        Ok(Self {
            path,
            options,
            state: RwLock::new(Some(opened)),
        })
    }

    /// Releases the table and environment. Calling it again is a no-op.
    ///
    /// An operation already in progress keeps its own environment handle,
    /// so the Engine closes the environment once that operation returns.
    /// Until then the path cannot be reopened.
    pub fn close(&self) {
        let opened = self.state.write().take();
        if let Some(Opened { env, .. }) = opened {
            let mut live = LIVE_ENVS.lock();
            live.remove(env.path());
            let _closing = env.prepare_for_closing();
            log::debug!("Closed store at {:?}", self.path);
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.read().is_none()
    }

    /// The path the store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The options the store was opened with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Looks up `key` in a read-only transaction.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Opened { env, db } = self.opened()?;
        let mut txn = ScopedTxn::new(&env);
        txn.begin(true)?;

        let value = db
            .get(txn.read_txn()?, key)
            .map_err(Error::engine_read)?
            .map(<[u8]>::to_vec);

        txn.commit()?;
        Ok(value)
    }

    /// Writes `key` → `value` in its own read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineWrite`] when the Engine rejects the write, for
    /// example an existing key under `no_overwrite`. Nothing is committed.
    /// `reserve` together with `no_dup_data` or `append` is an
    /// [`Error::InvalidArgument`].
    pub fn put(&self, key: &[u8], value: &[u8], flags: WriteFlags) -> Result<()> {
        flags.validate()?;
        let Opened { env, db } = self.opened()?;
        let write = || -> Result<()> {
            let mut txn = ScopedTxn::new(&env);
            txn.begin(false)?;

            let wtxn = txn.write_txn()?;
            let written = if flags.reserve {
                if flags.no_overwrite
                    && db.get(&**wtxn, key).map_err(Error::engine_write)?.is_some()
                {
                    return Err(Error::EngineWrite(KEY_EXISTS_TEXT.to_string()));
                }
                db.put_reserved(wtxn, key, value.len(), |space| space.write_all(value))
            } else {
                db.put_with_flags(wtxn, flags.put_flags(), key, value)
            };
            written.map_err(Error::engine_write)?;

            txn.commit()
        };
        write().map_err(into_write_error)
    }

    /// Deletes `key` in its own read-write transaction.
    ///
    /// # Errors
    ///
    /// Deleting a key that does not exist is an [`Error::EngineWrite`].
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        let Opened { env, db } = self.opened()?;
        let delete = || -> Result<()> {
            let mut txn = ScopedTxn::new(&env);
            txn.begin(false)?;

            let deleted = db
                .delete(txn.write_txn()?, key)
                .map_err(Error::engine_write)?;
            if !deleted {
                return Err(Error::EngineWrite(NOT_FOUND_TEXT.to_string()));
            }

            txn.commit()
        };
        delete().map_err(into_write_error)
    }

    /// Runs `f` against the raw environment and table handle.
    ///
    /// For callers that need more than one operation per transaction; pair it
    /// with [`ScopedTxn`] so cleanup still happens on every path.
    pub fn with_env<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Env, Database<Bytes, Bytes>) -> Result<R>,
    {
        let Opened { env, db } = self.opened()?;
        f(&env, db)
    }

    /// Snapshot of the environment and table, or `Closed`.
    pub(crate) fn opened(&self) -> Result<Opened> {
        self.state
            .read()
            .clone()
            .ok_or_else(|| Error::Closed(self.path.clone()))
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Opens the environment and its table, and claims the environment for
/// one store. On failure the environment is released again.
fn open_env(path: &Path, options: &Options) -> Result<Opened> {
    let fresh = !data_file(path, options).exists();

    let mut env_options = EnvOpenOptions::new();
    env_options.map_size(options.effective_map_size()?);
    // SAFETY: flags are passed through to the Engine unchanged; their
    // durability and locking trade-offs are the caller's choice.
    unsafe {
        env_options.flags(options.env_flags());
    }

    let mut live = LIVE_ENVS.lock();
    // SAFETY: the environment is owned by one store alone and the memory
    // map is never handed out beyond a transaction's lifetime.
    let env = unsafe { env_options.open(path) }.map_err(Error::engine_open)?;
    if live.contains(env.path()) {
        return Err(Error::EngineOpen(format!(
            "environment {:?} is already open in this process",
            env.path()
        )));
    }

    let setup = open_table(&env, options)
        .map_err(Error::into_open_error)
        .and_then(|db| {
            if fresh && !options.read_only {
                apply_file_mode(path, options)?;
            }
            Ok(db)
        });

    match setup {
        Ok(db) => {
            live.insert(env.path().to_path_buf());
            Ok(Opened { env, db })
        }
        Err(err) => {
            let _closing = env.prepare_for_closing();
            Err(err)
        }
    }
}

/// Opens or creates the unnamed table inside one setup transaction.
fn open_table(env: &Env, options: &Options) -> Result<Database<Bytes, Bytes>> {
    let mut txn = ScopedTxn::new(env);
    txn.begin(options.read_only)?;

    let mut db_options = env.database_options().types::<Bytes, Bytes>();
    db_options.flags(options.table_flags());

    let db = if options.should_create() {
        db_options
            .create(txn.write_txn()?)
            .map_err(Error::engine_open)?
    } else {
        db_options
            .open(txn.read_txn()?)
            .map_err(Error::engine_open)?
            .ok_or_else(|| Error::EngineOpen(NOT_FOUND_TEXT.to_string()))?
    };

    txn.commit()?;
    Ok(db)
}

/// Every failure of a write primitive surfaces as a write error.
fn into_write_error(err: Error) -> Error {
    match err {
        Error::EngineTxn(msg) | Error::EngineCursor(msg) | Error::EngineRead(msg) => {
            Error::EngineWrite(msg)
        }
        other => other,
    }
}

fn data_file(path: &Path, options: &Options) -> PathBuf {
    if options.no_sub_dir {
        path.to_path_buf()
    } else {
        path.join("data.mdb")
    }
}

fn lock_file(path: &Path, options: &Options) -> PathBuf {
    if options.no_sub_dir {
        let mut name = path.as_os_str().to_owned();
        name.push("-lock");
        PathBuf::from(name)
    } else {
        path.join("lock.mdb")
    }
}

#[cfg(unix)]
fn apply_file_mode(path: &Path, options: &Options) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for file in [data_file(path, options), lock_file(path, options)] {
        if file.exists() {
            fs::set_permissions(&file, fs::Permissions::from_mode(options.mode))
                .map_err(|e| Error::EngineOpen(format!("{}: {:?}", e, file)))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_file_mode(_path: &Path, _options: &Options) -> Result<()> {
    Ok(())
}
