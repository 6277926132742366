use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by a defaulting mechanism.
pub type DefaultsSource = Box<dyn std::error::Error + Send + Sync>;

/// A value could not be converted to the requested type.
///
/// Returned by the typed conversions in [`cast`](crate::cast) and by custom
/// casters registered with [`Binder::cast`](crate::Binder::cast).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct CastError(String);

impl CastError {
    pub fn new(reason: impl Into<String>) -> Self {
        CastError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("Failed to apply defaults: {0}")]
    Defaults(#[source] DefaultsSource),

    #[error("Caster for '{key}' failed: {source}")]
    Cast { key: String, source: CastError },

    #[error("Invalid value for '{key}': {source}")]
    Coerce { key: String, source: CastError },

    #[error("Cannot assign value to '{key}': {reason}")]
    Unassignable { key: String, reason: String },

    #[error("Schema nesting exceeds {limit} levels at '{key}' (recursive record?)")]
    DepthExceeded { key: String, limit: usize },

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize defaults: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<confique::Error> for BindError {
    fn from(err: confique::Error) -> Self {
        BindError::Defaults(Box::new(err))
    }
}
