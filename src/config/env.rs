//! `${NAME}` placeholder substitution on raw configuration text.
//!
//! Substitution runs before YAML parsing, so placeholders may appear
//! anywhere in the document, keys included. `\${` escapes a placeholder and
//! is turned into a literal `${` afterward.

use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\\)?\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid")
});

/// Name of a referenced variable that is not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedVariable(pub String);

/// Replaces every unescaped `${NAME}` with `env(NAME)`.
///
/// Fails on the first placeholder whose variable is undefined.
pub fn substitute_env_vars<F>(text: &str, env: F) -> Result<String, UndefinedVariable>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last..whole.start()]);

        if caps.get(1).is_some() {
            // escaped; unescaped below together with any other `\${`
            out.push_str(whole.as_str());
        } else {
            let name = &caps[2];
            let value = env(name).ok_or_else(|| UndefinedVariable(name.to_string()))?;
            out.push_str(&value);
        }

        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out.replace("\\${", "${"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "TOKEN" => Some("s3cr3t".to_string()),
            "KEY" => Some("dynamic".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_defined_variables() {
        let out = substitute_env_vars("token: ${TOKEN}\n${KEY}: 1", env).unwrap();
        assert_eq!(out, "token: s3cr3t\ndynamic: 1");
    }

    #[test]
    fn escaped_placeholder_round_trips() {
        let out = substitute_env_vars(r"body: \${NOT_SET} and \${TOKEN}", env).unwrap();
        assert_eq!(out, "body: ${NOT_SET} and ${TOKEN}");
    }

    #[test]
    fn lone_escape_is_unescaped() {
        let out = substitute_env_vars(r"cmd: echo \${", env).unwrap();
        assert_eq!(out, "cmd: echo ${");
    }

    #[test]
    fn undefined_variable_fails() {
        let err = substitute_env_vars("a: ${TOKEN}\nb: ${MISSING}", env).unwrap_err();
        assert_eq!(err, UndefinedVariable("MISSING".to_string()));
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let text = "pack:\n  dir: ./dist # $HOME is not a placeholder\n";
        assert_eq!(substitute_env_vars(text, env).unwrap(), text);
    }
}
