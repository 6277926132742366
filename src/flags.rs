//! Flag lookup: the binder's view of a command-line parser.
//!
//! The binder only asks whether a flag exists and, if so, hands its
//! [`Flag`] handle to the store. Parsing stays with the CLI framework; see
//! the clap adapter for `clap::ArgMatches`.

use std::collections::HashMap;

use toml::Value;

/// A flag as seen at bind time.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    /// Current value: what the user passed, or the parser's default.
    pub value: Option<Value>,
    /// True when the user supplied the value explicitly.
    pub changed: bool,
}

impl Flag {
    /// A flag the user passed on the command line.
    pub fn set(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Flag {
            name: name.into(),
            value: Some(value.into()),
            changed: true,
        }
    }

    /// A declared flag left at its default (`None` when it has no default).
    pub fn unset(name: impl Into<String>, default: Option<Value>) -> Self {
        Flag {
            name: name.into(),
            value: default,
            changed: false,
        }
    }
}

pub trait Flags {
    fn lookup(&self, name: &str) -> Option<Flag>;
}

/// A plain map of declared flags, for callers without a CLI framework.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: HashMap<String, Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: Flag) -> Self {
        self.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: Flag) {
        self.flags.insert(flag.name.clone(), flag);
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Flags for FlagSet {
    fn lookup(&self, name: &str) -> Option<Flag> {
        self.flags.get(name).cloned()
    }
}
