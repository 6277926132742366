use std::path::PathBuf;

use crate::schema::Kind;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
}

/// Ancestor key segments accumulated while descending into nested records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        KeyPath {
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Path for a nested record's children.
    pub fn child(&self, segment: &str) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        KeyPath { segments }
    }

    /// Fully-qualified store key: ancestors and `leaf` joined with `.`.
    pub fn store_key(&self, leaf: &str) -> String {
        self.join(leaf, ".")
    }

    /// Environment variable name: ancestors and `leaf` joined with `_`.
    ///
    /// With a non-empty `prefix` the result is `PREFIX_...`, upper-cased.
    /// Without one, segments keep their declared case.
    pub fn env_name(&self, leaf: &str, prefix: Option<&str>) -> String {
        let joined = self.join(leaf, "_");
        match prefix {
            Some(p) if !p.is_empty() => format!("{p}_{joined}").to_uppercase(),
            _ => joined,
        }
    }

    fn join(&self, leaf: &str, sep: &str) -> String {
        let mut parts: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        parts.push(leaf);
        parts.join(sep)
    }
}

/// The binding a leaf field would get, as reported by [`Binder::plan`](crate::Binder::plan).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub name: &'static str,
    pub store_key: String,
    pub env_name: Option<String>,
    pub flag: Option<&'static str>,
    pub kind: Kind,
    pub settable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_keys_are_bare() {
        let root = KeyPath::default();
        assert_eq!(root.store_key("name"), "name");
        assert_eq!(root.env_name("NAME", None), "NAME");
    }

    #[test]
    fn nested_store_key_uses_dots() {
        let path = KeyPath::default().child("outer").child("inner");
        assert_eq!(path.store_key("field"), "outer.inner.field");
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn env_name_uses_underscores_and_prefix() {
        let path = KeyPath::new(&["nested"]);
        assert_eq!(path.env_name("value", None), "nested_value");
        assert_eq!(path.env_name("value", Some("app")), "APP_NESTED_VALUE");
        assert_eq!(path.env_name("value", Some("")), "nested_value");
    }
}
