//! Clap adapter for autobind.
//!
//! Compiled only with the `clap` Cargo feature (on by default). It lets a
//! parsed `clap::ArgMatches` serve as the binder's flag source:
//!
//! ```ignore
//! let matches = cli_command().get_matches();
//! Binder::new()
//!     .env_prefix("myapp")
//!     .bind_with_flags(&mut config, &mut store, &matches)?;
//! ```
//!
//! Flag names are clap argument ids. Values are handed over as strings (or
//! arrays of strings for multi-valued args); the binder's coercion turns
//! them into the field's type.
//!
//! `ArgMatches` alone only knows the args clap recorded a value for, so an
//! arg that was declared but neither passed nor defaulted looks absent. Wrap
//! the command with [`ClapFlags`] when declared-but-absent args should still
//! be reported.

use clap::parser::ValueSource;
use clap::{ArgMatches, Command};
use toml::Value;

use crate::flags::{Flag, Flags};

impl Flags for ArgMatches {
    fn lookup(&self, name: &str) -> Option<Flag> {
        if !self.ids().any(|id| id.as_str() == name) {
            return None;
        }
        Some(read_flag(self, name))
    }
}

/// Flag source backed by a command and the matches it produced.
///
/// A name is a flag exactly when the command declares an arg with that id.
#[derive(Debug, Clone, Copy)]
pub struct ClapFlags<'a> {
    command: &'a Command,
    matches: &'a ArgMatches,
}

impl<'a> ClapFlags<'a> {
    pub fn new(command: &'a Command, matches: &'a ArgMatches) -> Self {
        ClapFlags { command, matches }
    }
}

impl Flags for ClapFlags<'_> {
    fn lookup(&self, name: &str) -> Option<Flag> {
        if !self.command.get_arguments().any(|arg| arg.get_id().as_str() == name) {
            return None;
        }
        Some(read_flag(self.matches, name))
    }
}

/// Read a known arg. Args without a recorded value come back unchanged and empty.
fn read_flag(matches: &ArgMatches, name: &str) -> Flag {
    let mut values: Vec<Value> = matches
        .try_get_raw(name)
        .ok()
        .flatten()
        .into_iter()
        .flatten()
        .map(|v| Value::String(v.to_string_lossy().into_owned()))
        .collect();
    let value = match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Value::Array(values)),
    };

    let changed = matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
    );

    Flag {
        name: name.to_string(),
        value,
        changed,
    }
}
