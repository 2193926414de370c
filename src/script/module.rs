//! The `lmdb` Lua module.
//!
//! Every function takes the integer handle returned by `lmdb.new` and
//! resolves it through the shared [`HandleRegistry`]; the Lua side never
//! holds anything else. Failures raise Lua errors carrying the
//! [`Error`](crate::Error) message.
//!
//! ```lua
//! local h = lmdb.new("/tmp/db", { NOSYNC = true })
//! lmdb.put(h, "a", "1")
//! lmdb.put(h, "b", "2", { NOOVERWRITE = true })
//! print(lmdb.get(h, "a"))                      --> 1
//! lmdb.each(h, function(k, v) print(k, v) end)
//! local n = lmdb.reduce(h, function(k, v, acc) return acc + 1 end, 0)
//! lmdb.remove(h, "a")
//! lmdb.delete(h)
//! ```

use std::sync::Arc;

use mlua::{Function, Integer, Lua, Table, Value};

use crate::registry::{Handle, HandleRegistry};
use crate::script::convert::{options_from_table, write_flags_from_table};
use crate::{Error, Result, Store};

/// Name of the global the module is installed under.
pub const MODULE_NAME: &str = "lmdb";

/// Builds the module table. Handles minted through it live in `registry`.
pub fn create_module<'lua>(
    lua: &'lua Lua,
    registry: Arc<HandleRegistry<Store>>,
) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;

    let reg = Arc::clone(&registry);
    let new_fn = lua.create_function(move |_, (path, opts): (String, Option<Table<'_>>)| {
        let options = options_from_table(opts)?;
        let store = Store::open(&path, options)?;
        Ok(reg.register(store).into_raw())
    })?;
    table.set("new", new_fn)?;

    let reg = Arc::clone(&registry);
    let delete_fn = lua.create_function(move |_, handle: Integer| {
        reg.destroy(handle_arg(handle)?)?;
        Ok(())
    })?;
    table.set("delete", delete_fn)?;

    let reg = Arc::clone(&registry);
    let get_fn = lua.create_function(move |lua, (handle, key): (Integer, mlua::String<'_>)| {
        let store = resolve(&reg, handle)?;
        match store.get(key.as_bytes())? {
            Some(value) => Ok(Value::String(lua.create_string(&value)?)),
            None => Ok(Value::Nil),
        }
    })?;
    table.set("get", get_fn)?;

    let reg = Arc::clone(&registry);
    let put_fn = lua.create_function(
        move |_,
              (handle, key, value, flags): (
            Integer,
            mlua::String<'_>,
            mlua::String<'_>,
            Option<Table<'_>>,
        )| {
            let flags = write_flags_from_table(flags)?;
            let store = resolve(&reg, handle)?;
            store.put(key.as_bytes(), value.as_bytes(), flags)?;
            Ok(())
        },
    )?;
    table.set("put", put_fn)?;

    let reg = Arc::clone(&registry);
    let remove_fn = lua.create_function(move |_, (handle, key): (Integer, mlua::String<'_>)| {
        let store = resolve(&reg, handle)?;
        store.remove(key.as_bytes())?;
        Ok(())
    })?;
    table.set("remove", remove_fn)?;

    let reg = Arc::clone(&registry);
    let each_fn = lua.create_function(move |lua, (handle, visitor): (Integer, Function<'_>)| {
        let store = resolve(&reg, handle)?;
        store.each(|key, value| {
            visitor.call::<_, ()>((lua.create_string(key)?, lua.create_string(value)?))
        })?;
        Ok(())
    })?;
    table.set("each", each_fn)?;

    let reg = registry;
    let reduce_fn = lua.create_function(
        move |lua, (handle, folder, initial): (Integer, Function<'_>, Value<'_>)| {
            let store = resolve(&reg, handle)?;
            let result = store.reduce(initial, |key, value, acc| {
                folder.call::<_, Value<'_>>((
                    lua.create_string(key)?,
                    lua.create_string(value)?,
                    acc,
                ))
            })?;
            Ok(result)
        },
    )?;
    table.set("reduce", reduce_fn)?;

    Ok(table)
}

/// Installs the module as the `lmdb` global of `lua`.
pub fn install(lua: &Lua, registry: Arc<HandleRegistry<Store>>) -> mlua::Result<()> {
    let module = create_module(lua, registry)?;
    lua.globals().set(MODULE_NAME, module)
}

fn handle_arg(raw: Integer) -> Result<Handle> {
    u64::try_from(raw)
        .map(Handle::from_raw)
        .map_err(|_| Error::InvalidHandle(raw.into()))
}

fn resolve(registry: &HandleRegistry<Store>, raw: Integer) -> Result<Arc<Store>> {
    registry.resolve(handle_arg(raw)?)
}
