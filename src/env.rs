//! Environment variable access for the layered store.
//!
//! Reads go through [`EnvSource`] so tests can hand the store a fixed
//! snapshot instead of mutating the process environment.

use std::collections::HashMap;

use toml::{Table, Value};

use crate::merge::insert_path;

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// Read `std::env` on every lookup.
    #[default]
    Process,
    /// A fixed snapshot.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    pub fn fixed(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        EnvSource::Fixed(vars.into_iter().collect())
    }

    /// Value of `name`. Empty values count as unset.
    pub fn var(&self, name: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn vars(&self) -> Vec<(String, String)> {
        match self {
            EnvSource::Process => std::env::vars().collect(),
            EnvSource::Fixed(vars) => vars
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Build a `toml::Table` from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels.
/// Single `_` within a segment is literal (part of the field name).
/// Segments are lowercased to match store keys.
///
/// Values are parsed heuristically: bool > integer > float > string.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() || value.is_empty() {
            continue;
        }

        let dotted = rest
            .split("__")
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(".");
        insert_path(&mut table, &dotted, parse_env_value(&value));
    }

    table
}

/// Parse an env var value into a typed TOML value.
/// Tries: bool → integer → float → string.
fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // Only use float if the string actually contains a dot,
    // to avoid "NaN" / "inf" being parsed as float.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fixed_source_reads_snapshot() {
        let env = EnvSource::fixed(vars(&[("APP_PORT", "8080"), ("APP_EMPTY", "")]));
        assert_eq!(env.var("APP_PORT").as_deref(), Some("8080"));
        assert_eq!(env.var("APP_EMPTY"), None);
        assert_eq!(env.var("APP_MISSING"), None);
    }

    #[test]
    fn nested_key() {
        let table = env_to_table("MYAPP", vars(&[("MYAPP__DATABASE__URL", "postgres://db")]));
        let db = table["database"].as_table().unwrap();
        assert_eq!(db["url"].as_str().unwrap(), "postgres://db");
    }

    #[test]
    fn single_underscore_preserved() {
        let table = env_to_table("MYAPP", vars(&[("MYAPP__POOL_SIZE", "10")]));
        assert_eq!(table["pool_size"].as_integer().unwrap(), 10);
    }

    #[test]
    fn values_parsed_heuristically() {
        let table = env_to_table(
            "APP",
            vars(&[
                ("APP__DEBUG", "FALSE"),
                ("APP__PORT", "3000"),
                ("APP__RATE", "1.5"),
                ("APP__NAME", "inf"),
            ]),
        );
        assert!(!table["debug"].as_bool().unwrap());
        assert_eq!(table["port"].as_integer().unwrap(), 3000);
        assert_eq!(table["rate"].as_float().unwrap(), 1.5);
        assert_eq!(table["name"].as_str().unwrap(), "inf");
    }

    #[test]
    fn unrelated_and_bare_prefix_ignored() {
        let table = env_to_table(
            "MYAPP",
            vars(&[("OTHER__HOST", "x"), ("MYAPP", "x"), ("MYAPP_HOST", "x")]),
        );
        assert!(table.is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn process_source_reads_live_environment() {
        let name = "AUTOBIND_ENV_TEST_VALUE";
        let env = EnvSource::Process;

        unsafe { std::env::set_var(name, "live") };
        assert_eq!(env.var(name).as_deref(), Some("live"));

        unsafe { std::env::set_var(name, "") };
        assert_eq!(env.var(name), None);

        unsafe { std::env::remove_var(name) };
        assert_eq!(env.var(name), None);
    }
}
