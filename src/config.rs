//! Configuration options for opening a store and writing records.
//!
//! Every flag is a pass-through boolean for the matching Engine flag. The
//! named setters accept the flag spelling used by the host surface
//! (`NOSUBDIR`, `DUPSORT`, `NOOVERWRITE`, ...), case-insensitively.

use std::fs;
use std::path::Path;

use heed::{DatabaseFlags, EnvFlags, PutFlags};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default memory map size: 10 MiB.
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

/// Default permission bits for the data and lock files.
pub const DEFAULT_MODE: u32 = 0o664;

/// Map sizes are rounded up to this boundary so they are always a multiple
/// of the OS page size.
const MAP_SIZE_ALIGN: usize = 64 * 1024;

/// Configuration options for opening a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Map the data file at a fixed address.
    pub fixed_map: bool,

    /// Treat the path as the data file itself rather than a directory.
    pub no_sub_dir: bool,

    /// Don't fsync after commit.
    pub no_sync: bool,

    /// Open the environment read-only.
    pub read_only: bool,

    /// Don't fsync the meta page after commit.
    pub no_meta_sync: bool,

    /// Write through a writable memory map.
    pub write_map: bool,

    /// Flush the writable map asynchronously.
    pub map_async: bool,

    /// Don't tie read slots to threads.
    pub no_tls: bool,

    /// Don't use the Engine's file locking.
    pub no_lock: bool,

    /// Disable OS readahead.
    pub no_read_ahead: bool,

    /// Don't zero-initialize malloc'd pages.
    pub no_mem_init: bool,

    /// Compare keys from the end of the byte string.
    pub reverse_key: bool,

    /// Allow duplicate keys (sorted duplicate data).
    pub dup_sort: bool,

    /// Keys are native-endian unsigned integers.
    pub integer_key: bool,

    /// Duplicate data items all have the same size.
    pub dup_fixed: bool,

    /// Duplicate data items are native-endian integers.
    pub integer_dup: bool,

    /// Compare duplicate data from the end of the byte string.
    pub reverse_dup: bool,

    /// Create the table if it does not exist.
    /// Default: None, meaning "create unless the environment is read-only".
    pub create: Option<bool>,

    /// Permission bits for newly created files.
    /// Default: 0o664
    pub mode: u32,

    /// Size of the memory map in bytes. The Engine cannot grow it on demand,
    /// so large datasets need an explicit, sufficiently large value.
    /// Default: 10MB
    pub map_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fixed_map: false,
            no_sub_dir: false,
            no_sync: false,
            read_only: false,
            no_meta_sync: false,
            write_map: false,
            map_async: false,
            no_tls: false,
            no_lock: false,
            no_read_ahead: false,
            no_mem_init: false,
            reverse_key: false,
            dup_sort: false,
            integer_key: false,
            dup_fixed: false,
            integer_dup: false,
            reverse_dup: false,
            create: None,
            mode: DEFAULT_MODE,
            map_size: DEFAULT_MAP_SIZE,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory map size.
    pub fn map_size(mut self, size: usize) -> Self {
        self.map_size = size;
        self
    }

    /// Sets the file mode for created files.
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Opens the environment read-only.
    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Uses a single data file instead of a directory.
    pub fn no_sub_dir(mut self, value: bool) -> Self {
        self.no_sub_dir = value;
        self
    }

    /// Skips fsync on commit.
    pub fn no_sync(mut self, value: bool) -> Self {
        self.no_sync = value;
        self
    }

    /// Enables duplicate keys.
    pub fn dup_sort(mut self, value: bool) -> Self {
        self.dup_sort = value;
        self
    }

    /// Enables reverse key ordering.
    pub fn reverse_key(mut self, value: bool) -> Self {
        self.reverse_key = value;
        self
    }

    /// Sets whether the table is created when missing.
    pub fn create(mut self, value: bool) -> Self {
        self.create = Some(value);
        self
    }

    /// Sets a boolean option by its host-facing name.
    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<()> {
        let slot = match name.to_ascii_uppercase().as_str() {
            "FIXEDMAP" => &mut self.fixed_map,
            "NOSUBDIR" => &mut self.no_sub_dir,
            "NOSYNC" => &mut self.no_sync,
            "RDONLY" => &mut self.read_only,
            "NOMETASYNC" => &mut self.no_meta_sync,
            "WRITEMAP" => &mut self.write_map,
            "MAPASYNC" => &mut self.map_async,
            "NOTLS" => &mut self.no_tls,
            "NOLOCK" => &mut self.no_lock,
            "NORDAHEAD" => &mut self.no_read_ahead,
            "NOMEMINIT" => &mut self.no_mem_init,
            "REVERSEKEY" => &mut self.reverse_key,
            "DUPSORT" => &mut self.dup_sort,
            "INTEGERKEY" => &mut self.integer_key,
            "DUPFIXED" => &mut self.dup_fixed,
            "INTEGERDUP" => &mut self.integer_dup,
            "REVERSEDUP" => &mut self.reverse_dup,
            "CREATE" => {
                self.create = Some(value);
                return Ok(());
            }
            "MODE" | "MAPSIZE" => {
                return Err(Error::invalid_argument(format!("option {} expects a number", name)))
            }
            _ => return Err(Error::invalid_argument(format!("unknown option: {}", name))),
        };
        *slot = value;
        Ok(())
    }

    /// Sets a numeric option (`MODE` or `MAPSIZE`) by its host-facing name.
    pub fn set_number(&mut self, name: &str, value: u64) -> Result<()> {
        match name.to_ascii_uppercase().as_str() {
            "MODE" => {
                self.mode = u32::try_from(value)
                    .map_err(|_| Error::invalid_argument(format!("mode out of range: {}", value)))?;
            }
            "MAPSIZE" => {
                self.map_size = usize::try_from(value).map_err(|_| {
                    Error::invalid_argument(format!("map size out of range: {}", value))
                })?;
            }
            _ => {
                return Err(Error::invalid_argument(format!(
                    "option {} is not numeric",
                    name
                )))
            }
        }
        Ok(())
    }

    /// Whether the table is created when missing.
    ///
    /// Read-only environments cannot create anything, so the default only
    /// creates for writable ones.
    pub fn should_create(&self) -> bool {
        self.create.unwrap_or(!self.read_only)
    }

    /// The map size actually handed to the Engine.
    ///
    /// Fails when rounding up to the alignment boundary overflows.
    pub fn effective_map_size(&self) -> Result<usize> {
        self.map_size
            .checked_next_multiple_of(MAP_SIZE_ALIGN)
            .ok_or_else(|| {
                Error::invalid_argument(format!("map size too large: {}", self.map_size))
            })
    }

    /// Engine environment flags.
    pub fn env_flags(&self) -> EnvFlags {
        let mut flags = EnvFlags::empty();
        let table = [
            (self.fixed_map, EnvFlags::FIXEDMAP),
            (self.no_sub_dir, EnvFlags::NO_SUB_DIR),
            (self.no_sync, EnvFlags::NO_SYNC),
            (self.read_only, EnvFlags::READ_ONLY),
            (self.no_meta_sync, EnvFlags::NO_META_SYNC),
            (self.write_map, EnvFlags::WRITE_MAP),
            (self.map_async, EnvFlags::MAP_ASYNC),
            (self.no_tls, EnvFlags::NO_TLS),
            (self.no_lock, EnvFlags::NO_LOCK),
            (self.no_read_ahead, EnvFlags::NO_READ_AHEAD),
            (self.no_mem_init, EnvFlags::NO_MEM_INIT),
        ];
        for (enabled, flag) in table {
            if enabled {
                flags |= flag;
            }
        }
        flags
    }

    /// Engine table flags. Creation is decided by [`Options::should_create`].
    pub fn table_flags(&self) -> DatabaseFlags {
        let mut flags = DatabaseFlags::empty();
        let table = [
            (self.reverse_key, DatabaseFlags::REVERSE_KEY),
            (self.dup_sort, DatabaseFlags::DUP_SORT),
            (self.integer_key, DatabaseFlags::INTEGER_KEY),
            (self.dup_fixed, DatabaseFlags::DUP_FIXED),
            (self.integer_dup, DatabaseFlags::INTEGER_DUP),
            (self.reverse_dup, DatabaseFlags::REVERSE_DUP),
        ];
        for (enabled, flag) in table {
            if enabled {
                flags |= flag;
            }
        }
        flags
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.map_size == 0 {
            return Err(Error::invalid_argument("map_size must be > 0"));
        }
        self.effective_map_size()?;
        if self.mode > 0o7777 {
            return Err(Error::invalid_argument(format!(
                "mode must be a permission mask, got {:#o}",
                self.mode
            )));
        }
        if self.read_only && self.create == Some(true) {
            return Err(Error::invalid_argument(
                "cannot create a table in a read-only environment",
            ));
        }
        Ok(())
    }

    /// Parses options from JSON. Missing fields take their defaults and the
    /// result is validated.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Options = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("Failed to parse options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the options to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::invalid_argument(format!("Failed to serialize options: {}", e)))
    }
}

/// Flags for a single `put`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteFlags {
    /// Fail if the exact key/value pair already exists (duplicate tables).
    pub no_dup_data: bool,

    /// Fail if the key already exists.
    pub no_overwrite: bool,

    /// Reserve space for the value and fill it in place.
    pub reserve: bool,

    /// Append at the end of the table; keys must arrive in order.
    pub append: bool,
}

impl WriteFlags {
    /// No flags: plain insert-or-overwrite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the no-overwrite flag.
    pub fn no_overwrite(mut self, value: bool) -> Self {
        self.no_overwrite = value;
        self
    }

    /// Sets the no-duplicate-data flag.
    pub fn no_dup_data(mut self, value: bool) -> Self {
        self.no_dup_data = value;
        self
    }

    /// Sets the reserve flag.
    pub fn reserve(mut self, value: bool) -> Self {
        self.reserve = value;
        self
    }

    /// Sets the append flag.
    pub fn append(mut self, value: bool) -> Self {
        self.append = value;
        self
    }

    /// Sets a flag by its host-facing name.
    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<()> {
        let slot = match name.to_ascii_uppercase().as_str() {
            "NODUPDATA" => &mut self.no_dup_data,
            "NOOVERWRITE" => &mut self.no_overwrite,
            "RESERVE" => &mut self.reserve,
            "APPEND" => &mut self.append,
            _ => return Err(Error::invalid_argument(format!("unknown write flag: {}", name))),
        };
        *slot = value;
        Ok(())
    }

    /// Engine put flags. `reserve` is not an Engine put flag here; it selects
    /// the reserved-write path instead.
    pub fn put_flags(&self) -> PutFlags {
        let mut flags = PutFlags::empty();
        if self.no_dup_data {
            flags |= PutFlags::NO_DUP_DATA;
        }
        if self.no_overwrite {
            flags |= PutFlags::NO_OVERWRITE;
        }
        if self.append {
            flags |= PutFlags::APPEND;
        }
        flags
    }

    /// Rejects combinations the reserved-write path cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.reserve && (self.no_dup_data || self.append) {
            return Err(Error::invalid_argument(
                "RESERVE cannot be combined with NODUPDATA or APPEND",
            ));
        }
        Ok(())
    }
}
