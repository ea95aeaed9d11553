//! `key=value` argument parsing
//!
//! Macro calls, markdown calls and command-line defines all pass bindings as
//! literal `key=value` strings. Each string is split on its first `=` only.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{CompileError, Result};

/// A flat set of variable bindings for one scope frame
pub type Bindings = BTreeMap<String, String>;

/// Parse `key=value` literals into bindings
///
/// Later duplicates overwrite earlier ones. An entry without `=` is an error.
pub fn parse_args<I, S>(args: I) -> Result<Bindings>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bindings = Bindings::new();
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((key, value)) => {
                debug!(%key, %value, "parse_args: binding");
                bindings.insert(key.to_string(), value.to_string());
            }
            None => {
                debug!(%arg, "parse_args: missing '='");
                return Err(CompileError::BadArgument { arg: arg.to_string() });
            }
        }
    }
    Ok(bindings)
}

/// Relaxed boolean parsing: anything unrecognised is `false`
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "t" | "true")
}

/// Look up `key` in `bindings` and parse it as a relaxed boolean
pub fn flag(bindings: &Bindings, key: &str) -> bool {
    bindings.get(key).is_some_and(|v| parse_bool(v))
}
