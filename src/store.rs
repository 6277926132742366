//! The key/value store the binder reads from.
//!
//! [`Store`] is the narrow interface the binder needs: look up a dotted key,
//! and accept env var and flag registrations for a key. [`LayeredStore`] is
//! the bundled implementation. Each `get` resolves through the layers in
//! priority order:
//!
//! ```text
//! set()                 explicit overrides
//! changed flags         bind_flag(), flag passed by the user
//! bound env vars        bind_env()
//! automatic env         PREFIX__SECTION__KEY
//! config files          merge_toml(), later files win
//! flag defaults         bind_flag(), flag left at its default
//! defaults              set_default() / defaults_from()
//! ```
//!
//! Every layer is sparse; a key missing from one layer falls through to the
//! next.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace};
use serde::{Serialize, ser};
use toml::{Table, Value};

use crate::env::{self, EnvSource};
use crate::error::BindError;
use crate::file;
use crate::flags::Flag;
use crate::merge::{deep_merge, insert_path, lookup};
use crate::types::SearchPath;

/// Layered key/value provider consulted by the binder.
pub trait Store {
    /// Resolved value for a dotted key, after precedence.
    fn get(&self, key: &str) -> Option<Value>;

    /// Fall back to `env_name` for `key` when no higher layer has a value.
    fn bind_env(&mut self, key: &str, env_name: &str);

    /// Let `flag` feed `key`: as an override if the user passed it, as a
    /// default otherwise.
    fn bind_flag(&mut self, key: &str, flag: Flag);
}

#[derive(Debug, Clone, Default)]
pub struct LayeredStore {
    defaults: Table,
    config: Table,
    env: EnvSource,
    env_bindings: HashMap<String, String>,
    automatic_env: Option<String>,
    flags: HashMap<String, Flag>,
    overrides: Table,
}

impl LayeredStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read environment variables from a fixed snapshot instead of the process.
    pub fn with_env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = EnvSource::fixed(vars);
        self
    }

    /// Map every `{prefix}__A__B` variable to key `a.b`, no binding needed.
    pub fn automatic_env(mut self, prefix: &str) -> Self {
        self.automatic_env = Some(prefix.to_string());
        self
    }

    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        insert_path(&mut self.defaults, key, value.into());
    }

    /// Seed the defaults layer from any serializable value, usually a config
    /// struct built by hand. `None` fields are skipped.
    pub fn defaults_from<S: Serialize>(&mut self, source: &S) -> Result<(), BindError> {
        let table = match Value::try_from(source)? {
            Value::Table(table) => table,
            other => {
                return Err(BindError::Serialize(ser::Error::custom(format!(
                    "defaults must serialize to a table, got {}",
                    other.type_str()
                ))));
            }
        };
        let defaults = std::mem::take(&mut self.defaults);
        self.defaults = deep_merge(defaults, table);
        Ok(())
    }

    /// Explicitly set a key. Beats every other layer.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        insert_path(&mut self.overrides, key, value.into());
    }

    /// Deep-merge a TOML document into the config-file layer.
    ///
    /// `origin` is only used for error messages.
    pub fn merge_toml(&mut self, origin: &Path, content: &str) -> Result<(), BindError> {
        let table: Table = toml::from_str(content).map_err(|e| BindError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })?;
        let config = std::mem::take(&mut self.config);
        self.config = deep_merge(config, table);
        Ok(())
    }

    /// Merge a single file. Returns `false` if it does not exist.
    pub fn merge_file(&mut self, path: &Path) -> Result<bool, BindError> {
        match file::read_config_file(path)? {
            Some(content) => {
                debug!("Merging config file {}", path.display());
                self.merge_toml(path, &content)?;
                Ok(true)
            }
            None => {
                trace!("Config file {} not found, skipping", path.display());
                Ok(false)
            }
        }
    }

    /// Merge `file_name` from every search path that has it, lowest priority first.
    /// Returns the number of files merged.
    pub fn load_files(
        &mut self,
        search_paths: &[SearchPath],
        file_name: &str,
        app_name: &str,
    ) -> Result<usize, BindError> {
        let files = file::load_config_files(search_paths, file_name, app_name)?;
        for (path, content) in &files {
            debug!("Merging config file {}", path.display());
            self.merge_toml(path, content)?;
        }
        Ok(files.len())
    }

    /// Whether any layer has a value for `key`.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn flag_value(&self, key: &str, changed: bool) -> Option<Value> {
        self.flags
            .get(key)
            .filter(|flag| flag.changed == changed)
            .and_then(|flag| flag.value.clone())
    }

    fn bound_env_value(&self, key: &str) -> Option<Value> {
        let name = self.env_bindings.get(key)?;
        self.env.var(name).map(Value::String)
    }

    fn automatic_env_value(&self, key: &str) -> Option<Value> {
        let prefix = self.automatic_env.as_deref()?;
        let table = env::env_to_table(prefix, self.env.vars());
        lookup(&table, key).cloned()
    }
}

impl Store for LayeredStore {
    fn get(&self, key: &str) -> Option<Value> {
        lookup(&self.overrides, key)
            .cloned()
            .or_else(|| self.flag_value(key, true))
            .or_else(|| self.bound_env_value(key))
            .or_else(|| self.automatic_env_value(key))
            .or_else(|| lookup(&self.config, key).cloned())
            .or_else(|| self.flag_value(key, false))
            .or_else(|| lookup(&self.defaults, key).cloned())
    }

    fn bind_env(&mut self, key: &str, env_name: &str) {
        self.env_bindings
            .insert(key.to_string(), env_name.to_string());
    }

    fn bind_flag(&mut self, key: &str, flag: Flag) {
        self.flags.insert(key.to_string(), flag);
    }
}
