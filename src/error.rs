//! Error types for the luamdb binding layer.

use std::io;
use std::path::PathBuf;

/// The result type used throughout luamdb.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for luamdb operations.
///
/// Engine variants carry the Engine's own status text. A read miss is not an
/// error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The environment or its table could not be opened.
    #[error("Engine open error: {0}")]
    EngineOpen(String),

    /// A transaction could not be started or committed.
    #[error("Engine transaction error: {0}")]
    EngineTxn(String),

    /// A cursor could not be opened.
    #[error("Engine cursor error: {0}")]
    EngineCursor(String),

    /// A lookup or traversal step failed.
    #[error("Engine read error: {0}")]
    EngineRead(String),

    /// A put or delete was rejected.
    #[error("Engine write error: {0}")]
    EngineWrite(String),

    /// The handle is unknown or was already destroyed. Carries the token as
    /// the caller passed it, so negative host integers are reported as such.
    #[error("Invalid handle: {0}")]
    InvalidHandle(i128),

    /// A host callback failed during `each` or `reduce`.
    #[error("Callback failure: {0}")]
    Callback(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A host script failed to load or run.
    #[error("Script error: {0}")]
    Script(String),

    /// The store was used after `close`.
    #[error("Store is closed: {0:?}")]
    Closed(PathBuf),

    /// An I/O error occurred outside the Engine.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new callback error from anything printable.
    pub fn callback(err: impl std::fmt::Display) -> Self {
        Error::Callback(err.to_string())
    }

    pub(crate) fn engine_open(err: heed::Error) -> Self {
        Error::EngineOpen(err.to_string())
    }

    pub(crate) fn engine_txn(err: heed::Error) -> Self {
        Error::EngineTxn(err.to_string())
    }

    pub(crate) fn engine_cursor(err: heed::Error) -> Self {
        Error::EngineCursor(err.to_string())
    }

    pub(crate) fn engine_read(err: heed::Error) -> Self {
        Error::EngineRead(err.to_string())
    }

    pub(crate) fn engine_write(err: heed::Error) -> Self {
        Error::EngineWrite(err.to_string())
    }

    /// Re-labels an Engine failure that happened while a store was being opened.
    pub(crate) fn into_open_error(self) -> Self {
        match self {
            Error::EngineTxn(msg)
            | Error::EngineCursor(msg)
            | Error::EngineRead(msg)
            | Error::EngineWrite(msg) => Error::EngineOpen(msg),
            other => other,
        }
    }

    /// Returns true for errors reported by the Engine itself.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Error::EngineOpen(_)
                | Error::EngineTxn(_)
                | Error::EngineCursor(_)
                | Error::EngineRead(_)
                | Error::EngineWrite(_)
        )
    }
}

#[cfg(feature = "lua")]
impl From<Error> for mlua::Error {
    fn from(err: Error) -> Self {
        mlua::Error::external(err)
    }
}

#[cfg(feature = "lua")]
impl From<mlua::Error> for Error {
    fn from(err: mlua::Error) -> Self {
        Error::Script(err.to_string())
    }
}
