//! Deep merge over the YAML value model.

use serde_yaml::{Mapping, Value};

/// Merges `source` into `target`.
///
/// Objects merge key by key, recursively. Arrays, scalars and nulls in
/// `source` replace whatever `target` holds at that position.
pub fn deep_merge(target: &mut Value, source: Value) {
    match source {
        Value::Mapping(entries) => {
            if !target.is_mapping() {
                *target = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(existing) = target {
                for (key, value) in entries {
                    match existing.get_mut(&key) {
                        Some(slot) => deep_merge(slot, value),
                        None => {
                            let mut slot = Value::Null;
                            deep_merge(&mut slot, value);
                            existing.insert(key, slot);
                        }
                    }
                }
            }
        }
        other => *target = other,
    }
}
