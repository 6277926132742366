//! Defaulting through confique.
//!
//! Config structs that derive [`confique::Config`] declare their defaults
//! with `#[config(default = ...)]`. [`load_defaults`] resets such a struct to
//! those defaults, which makes it a ready-made body for
//! [`Schema::apply_defaults`](crate::Schema::apply_defaults):
//!
//! ```ignore
//! impl Schema for AppConfig {
//!     fn fields(&mut self) -> Vec<Field<'_>> { /* ... */ }
//!
//!     fn apply_defaults(&mut self) -> Result<(), BindError> {
//!         autobind::defaults::load_defaults(self)
//!     }
//! }
//! ```
//!
//! A field without a default and without `Option` makes loading fail, which
//! aborts the bind pass.

use confique::Config;

use crate::error::BindError;

/// Replace `target` with its declared defaults.
pub fn load_defaults<C: Config>(target: &mut C) -> Result<(), BindError> {
    *target = C::builder().load()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{RequiredConfig, TestConfig, TestDbConfig};

    #[test]
    fn resets_to_declared_defaults() {
        let mut config = TestConfig {
            host: "elsewhere".into(),
            port: 1,
            debug: true,
            database: TestDbConfig {
                url: Some("pg://x".into()),
                pool_size: 0,
            },
        };
        load_defaults(&mut config).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn missing_required_value_fails() {
        let mut config = RequiredConfig {
            retries: 0,
            token: String::new(),
        };
        let err = load_defaults(&mut config).unwrap_err();
        assert!(matches!(err, BindError::Defaults(_)));
    }
}
