//! `publish` mapping to command line flags.

use crate::config::PassthroughMap;
use serde_json::Value;

/// Turns a flag mapping into arguments, in order.
///
/// `null` and `false` drop the flag, `true` emits it alone, anything else
/// emits the flag followed by its value. Keys without a leading `-` get
/// `--`.
pub fn flags_to_args(flags: &PassthroughMap) -> Vec<String> {
    let mut args = Vec::new();

    for (key, value) in flags {
        let flag = if key.starts_with('-') {
            key.clone()
        } else {
            format!("--{key}")
        };

        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => args.push(flag),
            Value::String(s) => {
                args.push(flag);
                args.push(s.clone());
            }
            other => {
                args.push(flag);
                args.push(other.to_string());
            }
        }
    }

    args
}
