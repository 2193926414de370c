//! LuaExecutor runs host scripts against a shared handle registry.
//!
//! Each call gets a fresh Lua VM with the `lmdb` module installed. The
//! registry outlives the VM, so a handle returned by one script can be used
//! by the next one.

use crate::registry::HandleRegistry;
use crate::script::module;
use crate::{Error, Result, Store};
use mlua::Lua;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// LuaExecutor executes Lua scripts with access to the `lmdb` module.
///
/// # Features
///
/// - **Shared Handles**: Stores opened by one script stay registered
/// - **Timeout Control**: Scripts can be limited to a maximum execution time
/// - **Descriptive Failures**: Lua errors come back as [`Error::Script`]
///
/// # Example
///
/// ```rust,no_run
/// use luamdb::script::LuaExecutor;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), luamdb::Error> {
/// let executor = LuaExecutor::new(Some(Duration::from_secs(5)));
///
/// let script = r#"
///     local h = lmdb.new("./data")
///     lmdb.put(h, "user:1", "Alice")
///     lmdb.put(h, "user:2", "Bob")
///     return lmdb.reduce(h, function(k, v, acc) return acc .. v end, "")
/// "#;
///
/// let names = executor.execute_with_result(script)?;
/// assert_eq!(names, Some("AliceBob".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct LuaExecutor {
    /// Handles shared by every script run through this executor
    registry: Arc<HandleRegistry<Store>>,

    /// Maximum script execution time
    timeout: Option<Duration>,
}

impl LuaExecutor {
    /// Creates a new LuaExecutor with its own registry.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Optional maximum execution time for scripts
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_registry(Arc::new(HandleRegistry::new()), timeout)
    }

    /// Creates a LuaExecutor over an existing registry.
    pub fn with_registry(registry: Arc<HandleRegistry<Store>>, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    /// Executes a Lua script.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Script`] if the script has syntax errors, raises an
    /// error (including one raised by an `lmdb` call), or times out.
    pub fn execute(&self, script: &str) -> Result<()> {
        let start_time = Instant::now();
        let lua = self.prepare(start_time)?;

        match lua.load(script).exec() {
            Ok(()) => {
                log::info!("Lua script executed successfully in {:?}", start_time.elapsed());
                Ok(())
            }
            Err(e) => {
                log::warn!("Lua script failed: {}", e);
                Err(Error::Script(format!("Lua script failed: {}", e)))
            }
        }
    }

    /// Executes a Lua script and returns its result value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))` if the script returned a string (or any other
    ///   non-nil value, formatted)
    /// - `Ok(None)` if the script returned nil or nothing
    /// - `Err(_)` if the script failed
    pub fn execute_with_result(&self, script: &str) -> Result<Option<String>> {
        let start_time = Instant::now();
        let lua = self.prepare(start_time)?;

        let value = match lua.load(script).eval::<mlua::Value<'_>>() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Lua script failed: {}", e);
                return Err(Error::Script(format!("Lua script failed: {}", e)));
            }
        };

        let return_value = match value {
            mlua::Value::String(s) => Some(s.to_str()?.to_string()),
            mlua::Value::Integer(n) => Some(n.to_string()),
            mlua::Value::Number(n) => Some(n.to_string()),
            mlua::Value::Boolean(b) => Some(b.to_string()),
            mlua::Value::Nil => None,
            other => Some(format!("{:?}", other)),
        };

        log::info!("Lua script executed successfully in {:?}", start_time.elapsed());
        Ok(return_value)
    }

    /// Creates a VM with the module installed and the timeout hook armed.
    fn prepare(&self, start_time: Instant) -> Result<Lua> {
        let lua = Lua::new();

        if let Some(timeout) = self.timeout {
            lua.set_hook(
                mlua::HookTriggers {
                    every_nth_instruction: Some(1000),
                    ..Default::default()
                },
                move |_lua, _debug| {
                    if start_time.elapsed() > timeout {
                        Err(mlua::Error::RuntimeError("Script execution timeout".to_string()))
                    } else {
                        Ok(())
                    }
                },
            );
        }

        module::install(&lua, Arc::clone(&self.registry))?;
        Ok(lua)
    }

    /// The registry scripts open stores into.
    pub fn registry(&self) -> &Arc<HandleRegistry<Store>> {
        &self.registry
    }

    /// Sets the timeout for script execution.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum execution time, or None for no limit
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Gets the current timeout setting.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
