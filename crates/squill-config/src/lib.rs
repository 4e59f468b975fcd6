//! Typed option map for the squill toolchain.
//!
//! Options flow in from three places with identical semantics: a
//! configuration file loaded by the CLI, `#FORMAT` / `#LINT` macros embedded
//! in SQL source, and programmatic callers. A [`Config`] stores each option
//! under its name with two write operations: [`Config::set`] replaces and
//! [`Config::add`] appends to a list-valued option.
//!
//! Unknown option names are the caller's problem to diagnose; the map itself
//! accepts any key so that unknown keys can be reported as diagnostics
//! rather than hard errors.

use std::collections::BTreeMap;
use std::fmt;

/// A configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    /// A nested option map, e.g. the `{level, priority}` sub-config a
    /// `#LINT rule <level> [priority]` macro produces.
    Map(Config),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::List(items) => f.write_str(&items.join(",")),
            Value::Map(_) => f.write_str("{...}"),
        }
    }
}

/// An ordered name → value option map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    values: BTreeMap<String, Value>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into().to_ascii_lowercase(), value);
    }

    /// Append to the list stored under `key`, promoting a missing or
    /// scalar-valued entry to a list first.
    pub fn add(&mut self, key: impl Into<String>, item: impl Into<String>) {
        let key = key.into().to_ascii_lowercase();
        match self.values.get_mut(&key) {
            Some(Value::List(items)) => items.push(item.into()),
            Some(other) => {
                let first = other.to_string();
                *other = Value::List(vec![first, item.into()]);
            }
            None => {
                self.values.insert(key, Value::List(vec![item.into()]));
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&key.to_ascii_lowercase())
    }

    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Option names the formatter-facing configuration recognises. Keys outside
/// this set (and [`LINT_RULES`], which linters own) warrant a diagnostic.
pub const FORMAT_KEYS: &[&str] = &[
    "as", "comma", "quote", "compact", "space", "keepspace", "comment", "crlf", "newline",
    "upperize", "rewrite", "indent",
];

/// Parse a key-value configuration file: one `key value` or `key = value`
/// pair per line, `#` comments, blank lines ignored. Returns the map plus
/// the list of unrecognised keys for the caller to report.
#[must_use]
pub fn parse_file(content: &str) -> (Config, Vec<String>) {
    let mut config = Config::new();
    let mut unknown = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, |c: char| c == '=' || c.is_whitespace());
        let Some(key) = parts.next() else { continue };
        let value = parts
            .next()
            .unwrap_or("")
            .trim()
            .trim_start_matches('=')
            .trim();
        let key = key.trim().to_ascii_lowercase();
        if !FORMAT_KEYS.contains(&key.as_str()) && !key.starts_with("lint.") {
            unknown.push(key.clone());
        }
        if let Ok(v) = value.parse::<bool>() {
            config.set(key, Value::Bool(v));
        } else if let Ok(v) = value.parse::<i64>() {
            config.set(key, Value::Int(v));
        } else if value.contains(',') {
            config.set(
                key,
                Value::List(value.split(',').map(|s| s.trim().to_string()).collect()),
            );
        } else {
            config.set(key, Value::Str(value.to_string()));
        }
    }
    (config, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_add_appends() {
        let mut config = Config::new();
        config.set("indent", Value::Int(2));
        config.set("indent", Value::Int(4));
        assert_eq!(config.int("indent"), Some(4));

        config.add("rewrite", "std-op");
        config.add("rewrite", "std-expr");
        assert_eq!(
            config.list("rewrite"),
            Some(&["std-op".to_string(), "std-expr".to_string()][..])
        );
    }

    #[test]
    fn add_promotes_scalar_to_list() {
        let mut config = Config::new();
        config.set("upperize", Value::Str("keyword".into()));
        config.add("upperize", "identifier");
        assert_eq!(
            config.list("upperize"),
            Some(&["keyword".to_string(), "identifier".to_string()][..])
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        let mut config = Config::new();
        config.set("Compact", Value::Bool(true));
        assert_eq!(config.bool("compact"), Some(true));
    }

    #[test]
    fn parse_file_reports_unknown_keys() {
        let (config, unknown) = parse_file("indent 4\nquote true\nmystery 1\n# comment\n");
        assert_eq!(config.int("indent"), Some(4));
        assert_eq!(config.bool("quote"), Some(true));
        assert_eq!(unknown, vec!["mystery"]);
    }
}
