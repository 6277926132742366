//! Bind command-line flags, environment variables and layered config files
//! onto typed Rust structs.
//!
//! Autobind walks a config struct field by field and fills each one from the
//! highest-priority source that has a value for it:
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! let mut store = LayeredStore::new();
//! store.load_files(&[SearchPath::Platform, SearchPath::Cwd], "myapp.toml", "myapp")?;
//!
//! Binder::new()
//!     .env_prefix("myapp")
//!     .apply_defaults(true)
//!     .bind_with_flags(&mut config, &mut store, &matches)?;
//! ```
//!
//! # Describing a struct
//!
//! There is no runtime reflection. A config struct implements [`Schema`] by
//! listing its fields, each with a typed [`Slot`] borrowed from the struct and
//! up to three annotations:
//!
//! - **`key`**: name in the store namespace. Fields without a key are never
//!   touched.
//! - **`env`**: environment variable that feeds the key.
//! - **`flag`**: command-line flag that overrides the key.
//!
//! Nested structs are declared with [`Field::nested`] and are walked
//! recursively.
//!
//! # Key composition
//!
//! | Declared                           | Store key            | Env var (prefix `APP`) |
//! |------------------------------------|----------------------|------------------------|
//! | `port` at the root                 | `port`               | `APP_PORT`             |
//! | `url` inside `database`            | `database.url`       | `APP_DATABASE_URL`     |
//! | `url` inside `database`, no nesting| `url`                | `APP_URL`              |
//!
//! Store keys always join with `.`, env names with `_`. Env names are
//! upper-cased only when a prefix is set. Turning off
//! [`use_nesting`](Binder::use_nesting) keys every record's fields as if they
//! were at the root, for flat config files behind a structured struct.
//!
//! # Precedence
//!
//! The binder itself only reads from a [`Store`]. The bundled
//! [`LayeredStore`] resolves each key through these layers, highest first:
//!
//! ```text
//! set()            explicit overrides
//! flags            passed on the command line
//! env vars         registered by the binder from `env` annotations
//! automatic env    PREFIX__SECTION__KEY, if enabled
//! config files     later files win
//! flag defaults    flags left at their parser default
//! store defaults   set_default() / defaults_from()
//! ```
//!
//! Struct defaults sit below all of these: with
//! [`apply_defaults`](Binder::apply_defaults) the root is reset through
//! [`Schema::apply_defaults`] (see [`defaults`] for the confique helper) and
//! any field the store has no value for keeps its default.
//!
//! # Coercion
//!
//! Store values are dynamic ([`toml::Value`]); each slot converts them
//! permissively: `"true"` binds to a `bool`, `"8080"` to a `u16`, `"1s"` to a
//! [`Duration`](std::time::Duration), `"a,b"` to a `Vec<String>`. A value
//! that cannot be converted sets the field to its zero value: `false`, `0`,
//! empty strings and lists, [`Duration::ZERO`](std::time::Duration::ZERO),
//! the Unix epoch for timestamps, and `None` for `Option` fields. Enable
//! [`strict`](Binder::strict) to get an error instead. See [`cast`] for the
//! accepted forms.
//!
//! `Option<T>` of any built-in type (see [`Coerce`]) binds with the same
//! rules, wrapped in `Some`.
//!
//! Types without a built-in slot use [`Slot::custom`], which deserializes
//! with serde. Combine it with a [caster](Binder::cast) to reshape raw values
//! (e.g. a list of tables) before they are assigned.
//!
//! # Errors
//!
//! A failing defaults reset, a failing caster, or a custom slot that cannot
//! take its value abort the pass with a [`BindError`]. Treat that as fatal:
//! the struct may be partially bound. Missing keys and read-only fields are
//! not errors.

pub mod cast;
pub mod defaults;
pub mod error;
pub mod types;

mod binder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
mod flags;
pub(crate) mod merge;
mod observe;
mod schema;
mod store;

#[cfg(test)]
mod fixtures;

pub use binder::{BindOptions, Binder, Caster};
#[cfg(feature = "clap")]
pub use cli::ClapFlags;
pub use error::{BindError, CastError};
pub use flags::{Flag, FlagSet, Flags};
pub use observe::{BindEvent, BindObserver, BindSummary, LogObserver, NoopObserver};
pub use schema::{Binding, Coerce, CustomSlot, Field, Kind, OptionalSlot, Schema, Slot, Target};
pub use store::{LayeredStore, Store};
pub use types::{FieldPlan, KeyPath, SearchPath};
