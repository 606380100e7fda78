//! `--set key=value` overrides in dot notation.
//!
//! - `\.` and `\=` inside the key are literal characters, not separators
//! - values are inferred as `true`/`false`/`null`/numbers when unambiguous
//! - a bare `key` without `=` sets boolean `true`
//! - a segment followed by a non-negative integer segment creates an array,
//!   so `a.0.b=x` builds `{a: [{b: "x"}]}`

use super::ConfigError;
use serde_yaml::{Mapping, Number, Value};

/// Parses one override into its key segments and inferred value.
pub fn parse_override(item: &str) -> Result<(Vec<String>, Value), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidOverride {
        value: item.to_string(),
        reason: reason.to_string(),
    };

    let (segments, raw_value) = split_key(item);

    if segments.iter().all(|s| s.is_empty()) {
        return Err(invalid("Expected format is key=value."));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("Key segments must not be empty."));
    }

    let value = match raw_value {
        Some(raw) => infer_scalar(raw),
        None => Value::Bool(true),
    };

    Ok((segments, value))
}

/// Folds all overrides, in order, into one nested value. Later overrides of
/// the same path win.
pub fn overrides_to_value(items: &[String]) -> Result<Value, ConfigError> {
    let mut root = Value::Mapping(Mapping::new());

    for item in items {
        let (segments, value) = parse_override(item)?;
        set_path(&mut root, &segments, value).map_err(|reason| ConfigError::InvalidOverride {
            value: item.clone(),
            reason,
        })?;
    }

    Ok(root)
}

/// Splits at unescaped `.` until the first unescaped `=`.
fn split_key(item: &str) -> (Vec<String>, Option<&str>) {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = item.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&(_, next @ ('.' | '='))) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push('\\'),
            },
            '.' => segments.push(std::mem::take(&mut current)),
            '=' => {
                segments.push(current);
                return (segments, Some(&item[idx + 1..]));
            }
            _ => current.push(c),
        }
    }

    segments.push(current);
    (segments, None)
}

/// Booleans, null and numbers whose canonical form is exactly the input;
/// anything else stays a string (`1.0`, `007` and `1e3` are strings).
fn infer_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        if int.to_string() == raw {
            return Value::Number(Number::from(int));
        }
    }

    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() && float.to_string() == raw {
            return Value::Number(Number::from(float));
        }
    }

    Value::String(raw.to_string())
}

/// Largest array index an override may address; the array is padded with
/// nulls up to it.
const MAX_ARRAY_INDEX: usize = 1024;

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn empty_container(next_segment: &str) -> Value {
    if is_index(next_segment) {
        Value::Sequence(Vec::new())
    } else {
        Value::Mapping(Mapping::new())
    }
}

fn set_path(root: &mut Value, segments: &[String], value: Value) -> Result<(), String> {
    let Some((last, parents)) = segments.split_last() else {
        return Err("Expected format is key=value.".to_string());
    };

    let mut current = root;
    for (idx, key) in parents.iter().enumerate() {
        let next = &segments[idx + 1];
        current = child_container(current, key, next)?;
    }

    *slot(current, last)? = value;
    Ok(())
}

/// Returns the container stored under `key`, creating (or replacing a
/// scalar with) an array or object depending on the next segment.
fn child_container<'a>(
    parent: &'a mut Value,
    key: &str,
    next_segment: &str,
) -> Result<&'a mut Value, String> {
    let child = slot(parent, key)?;
    if !matches!(child, Value::Mapping(_) | Value::Sequence(_)) {
        *child = empty_container(next_segment);
    }
    Ok(child)
}

fn slot<'a>(container: &'a mut Value, key: &str) -> Result<&'a mut Value, String> {
    match container {
        Value::Mapping(map) => Ok(map
            .entry(Value::String(key.to_string()))
            .or_insert(Value::Null)),
        Value::Sequence(items) => {
            let index: usize = key
                .parse()
                .map_err(|_| format!("\"{key}\" is not an index into an array."))?;
            if index > MAX_ARRAY_INDEX {
                return Err(format!(
                    "\"{key}\" is out of range; array indices go up to {MAX_ARRAY_INDEX}."
                ));
            }
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        _ => Err(format!("\"{key}\" cannot be set on a scalar value.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn set(items: &[&str]) -> Value {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        overrides_to_value(&items).unwrap()
    }

    #[test]
    fn builds_nested_objects() {
        assert_eq!(
            set(&["npm.packageJson.version=1.0.0"]),
            parse("npm: {packageJson: {version: '1.0.0'}}")
        );
    }

    #[test]
    fn numeric_segment_creates_array() {
        assert_eq!(set(&["a.0.b=x"]), parse("a: [{b: x}]"));
        assert_eq!(set(&["a.2=x"]), parse("a: [null, null, x]"));
    }

    #[test]
    fn escaped_separators_are_literal() {
        assert_eq!(
            set(&[r"npm.publish.registry\=https://registry\.npmjs\.org/"]),
            parse("npm: {publish: {'registry=https://registry.npmjs.org/': true}}")
        );
        assert_eq!(set(&[r"a\.b.c=1"]), parse("{'a.b': {c: 1}}"));
    }

    #[test]
    fn value_keeps_everything_after_first_separator() {
        assert_eq!(
            set(&["github.release.body=a=b.c"]),
            parse("github: {release: {body: 'a=b.c'}}")
        );
    }

    #[test]
    fn infers_scalar_types() {
        assert_eq!(infer_scalar("true"), Value::Bool(true));
        assert_eq!(infer_scalar("false"), Value::Bool(false));
        assert_eq!(infer_scalar("null"), Value::Null);
        assert_eq!(infer_scalar("42"), Value::Number(42i64.into()));
        assert_eq!(infer_scalar("-7"), Value::Number((-7i64).into()));
        assert_eq!(infer_scalar("1.5"), Value::Number(1.5f64.into()));
        assert_eq!(infer_scalar("1.0"), Value::String("1.0".into()));
        assert_eq!(infer_scalar("007"), Value::String("007".into()));
        assert_eq!(infer_scalar("1.0.0"), Value::String("1.0.0".into()));
        assert_eq!(infer_scalar("inf"), Value::String("inf".into()));
        assert_eq!(infer_scalar(""), Value::String(String::new()));
    }

    #[test]
    fn bare_key_is_true() {
        assert_eq!(set(&["github.release.draft"]), parse("github: {release: {draft: true}}"));
    }

    #[test]
    fn later_override_wins() {
        assert_eq!(set(&["a.b.c=x", "a.b.c=y"]), parse("a: {b: {c: y}}"));
    }

    #[test]
    fn deeper_override_replaces_scalar() {
        assert_eq!(set(&["a=1", "a.b=2"]), parse("a: {b: 2}"));
    }

    #[test]
    fn rejects_empty_keys() {
        assert!(parse_override("=value").is_err());
        assert!(parse_override("").is_err());
        assert!(parse_override("a..b=1").is_err());
    }

    #[test]
    fn rejects_out_of_range_index() {
        for item in ["a.18446744073709551615=x", "a.10000000000=x", "a.1025=x"] {
            let err = overrides_to_value(&[item.to_string()]).unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigError::InvalidOverride { ref reason, .. } if reason.contains("out of range")
                ),
                "{item}: {err}"
            );
        }
        assert_eq!(set(&["a.1024=x"])["a"].as_sequence().unwrap().len(), 1025);
    }

    #[test]
    fn index_beyond_usize_is_rejected() {
        assert!(overrides_to_value(&["a.99999999999999999999999=x".to_string()]).is_err());
    }

    #[test]
    fn rejects_named_key_on_array() {
        let items = vec!["a.0=x".to_string(), "a.b=y".to_string()];
        assert!(overrides_to_value(&items).is_err());
    }
}
