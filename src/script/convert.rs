//! Lua table → option conversion.
//!
//! Options tables accept both `{ NOSYNC = true, MAPSIZE = 1048576 }` and the
//! list form `{ "NOSYNC", "NOSUBDIR" }`, which sets each named flag to true.

use mlua::{Table, Value};

use crate::config::{Options, WriteFlags};
use crate::{Error, Result};

/// Builds store options from an optional Lua table.
pub fn options_from_table(table: Option<Table<'_>>) -> Result<Options> {
    let mut options = Options::default();
    let Some(table) = table else {
        return Ok(options);
    };

    for pair in table.pairs::<Value<'_>, Value<'_>>() {
        let (key, value) = pair?;
        match (key, value) {
            (Value::Integer(_), Value::String(name)) => {
                options.set_flag(name.to_str()?, true)?;
            }
            (Value::String(name), value) => {
                let name = name.to_str()?;
                match value {
                    Value::Boolean(flag) => options.set_flag(name, flag)?,
                    Value::Integer(n) => options.set_number(name, non_negative(name, n)?)?,
                    Value::Number(n) => options.set_number(name, integral(name, n)?)?,
                    other => {
                        return Err(Error::invalid_argument(format!(
                            "option {} has unsupported type {}",
                            name,
                            other.type_name()
                        )))
                    }
                }
            }
            (key, _) => {
                return Err(Error::invalid_argument(format!(
                    "option names must be strings, got {}",
                    key.type_name()
                )))
            }
        }
    }

    Ok(options)
}

/// Builds write flags from an optional Lua table.
pub fn write_flags_from_table(table: Option<Table<'_>>) -> Result<WriteFlags> {
    let mut flags = WriteFlags::default();
    let Some(table) = table else {
        return Ok(flags);
    };

    for pair in table.pairs::<Value<'_>, Value<'_>>() {
        let (key, value) = pair?;
        match (key, value) {
            (Value::Integer(_), Value::String(name)) => flags.set_flag(name.to_str()?, true)?,
            (Value::String(name), Value::Boolean(flag)) => flags.set_flag(name.to_str()?, flag)?,
            (key, value) => {
                return Err(Error::invalid_argument(format!(
                    "write flags must be NAME = boolean, got {} = {}",
                    key.type_name(),
                    value.type_name()
                )))
            }
        }
    }

    Ok(flags)
}

fn non_negative(name: &str, n: mlua::Integer) -> Result<u64> {
    u64::try_from(n)
        .map_err(|_| Error::invalid_argument(format!("option {} must not be negative", name)))
}

fn integral(name: &str, n: mlua::Number) -> Result<u64> {
    if n.fract() != 0.0 || n < 0.0 || n > u64::MAX as f64 {
        return Err(Error::invalid_argument(format!(
            "option {} must be a non-negative integer, got {}",
            name, n
        )));
    }
    Ok(n as u64)
}
