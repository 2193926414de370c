//! Lua host environment.
//!
//! This module exposes stores to Lua through opaque integer handles. Lua
//! code only ever holds the handle; the [`HandleRegistry`](crate::HandleRegistry)
//! owns the stores between calls.
//!
//! # Architecture
//!
//! - **module**: builds the `lmdb` table (`new`, `delete`, `get`, `put`,
//!   `remove`, `each`, `reduce`)
//! - **convert**: turns Lua option tables into [`Options`](crate::Options)
//!   and [`WriteFlags`](crate::WriteFlags)
//! - **LuaExecutor**: runs scripts with the module installed
//!
//! # Example
//!
//! ```rust,no_run
//! use luamdb::script::LuaExecutor;
//!
//! # fn main() -> Result<(), luamdb::Error> {
//! let executor = LuaExecutor::new(None);
//!
//! let script = r#"
//!     local h = lmdb.new("./data", { MAPSIZE = 64 * 1024 * 1024 })
//!     lmdb.put(h, "a", "1")
//!     lmdb.put(h, "b", "2")
//!
//!     local keys = {}
//!     lmdb.each(h, function(k, v) keys[#keys + 1] = k end)
//!     lmdb.delete(h)
//!     return table.concat(keys, ",")
//! "#;
//!
//! assert_eq!(executor.execute_with_result(script)?, Some("a,b".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod lua_executor;
pub mod module;

pub use lua_executor::LuaExecutor;
pub use module::{create_module, install, MODULE_NAME};
