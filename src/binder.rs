use std::collections::HashMap;

use toml::Value;

use crate::error::{BindError, CastError};
use crate::flags::{FlagSet, Flags};
use crate::observe::{BindEvent, BindObserver, BindSummary, LogObserver};
use crate::schema::{Field, Schema, Slot, Target};
use crate::store::Store;
use crate::types::{FieldPlan, KeyPath};

/// Custom conversion for one fully-qualified store key.
///
/// Runs on the raw store value before it is assigned. An error aborts the
/// bind pass.
pub type Caster = Box<dyn Fn(Value) -> Result<Value, CastError>>;

/// Binder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Prefix store keys of nested records with the record's key (default: `true`).
    /// When off, every record's fields are keyed as if at the root.
    pub use_nesting: bool,
    /// Global env var prefix. When set, env names become `PREFIX_PATH_NAME`, upper-cased.
    pub env_prefix: Option<String>,
    /// Call [`Schema::apply_defaults`] on the root before binding (default: `false`).
    pub apply_defaults: bool,
    /// Turn default-path coercion failures into errors (default: `false`).
    pub strict: bool,
    /// Deepest record nesting accepted before the pass is aborted.
    pub max_depth: usize,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            use_nesting: true,
            env_prefix: None,
            apply_defaults: false,
            strict: false,
            max_depth: 32,
        }
    }
}

/// Walks a [`Schema`] and fills its fields from a [`Store`].
///
/// ```ignore
/// let mut store = LayeredStore::new();
/// store.load_files(&[SearchPath::Platform], "myapp.toml", "myapp")?;
///
/// let mut config = AppConfig::default();
/// Binder::new()
///     .env_prefix("myapp")
///     .apply_defaults(true)
///     .bind_with_flags(&mut config, &mut store, &matches)?;
/// ```
pub struct Binder {
    options: BindOptions,
    casters: HashMap<String, Caster>,
    observer: Box<dyn BindObserver>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    pub fn new() -> Self {
        Self::with_options(BindOptions::default())
    }

    pub fn with_options(options: BindOptions) -> Self {
        Binder {
            options,
            casters: HashMap::new(),
            observer: Box::new(LogObserver),
        }
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    pub fn use_nesting(mut self, enabled: bool) -> Self {
        self.options.use_nesting = enabled;
        self
    }

    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.options.env_prefix = Some(prefix.to_string());
        self
    }

    pub fn apply_defaults(mut self, enabled: bool) -> Self {
        self.options.apply_defaults = enabled;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Register a caster for a fully-qualified store key. Replaces any earlier one.
    pub fn cast<F>(mut self, key: &str, caster: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CastError> + 'static,
    {
        self.casters.insert(key.to_string(), Box::new(caster));
        self
    }

    pub fn observer(mut self, observer: impl BindObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Bind without any flag source.
    pub fn bind<S: Schema>(
        &self,
        schema: &mut S,
        store: &mut dyn Store,
    ) -> Result<BindSummary, BindError> {
        self.bind_at(schema, store, &FlagSet::new(), &KeyPath::default())
    }

    pub fn bind_with_flags<S: Schema>(
        &self,
        schema: &mut S,
        store: &mut dyn Store,
        flags: &dyn Flags,
    ) -> Result<BindSummary, BindError> {
        self.bind_at(schema, store, flags, &KeyPath::default())
    }

    /// Bind `schema` as if it were nested under `prefix`.
    pub fn bind_at(
        &self,
        schema: &mut dyn Schema,
        store: &mut dyn Store,
        flags: &dyn Flags,
        prefix: &KeyPath,
    ) -> Result<BindSummary, BindError> {
        if self.options.apply_defaults {
            schema.apply_defaults()?;
        }

        let mut pass = Pass {
            store,
            flags,
            summary: BindSummary::default(),
        };
        self.bind_record(schema, prefix, 0, &mut pass)?;

        self.observer.on_event(&BindEvent::PassComplete {
            summary: &pass.summary,
        });
        Ok(pass.summary)
    }

    /// Describe the binding of every keyed leaf, without touching any store.
    pub fn plan(&self, schema: &mut dyn Schema) -> Result<Vec<FieldPlan>, BindError> {
        let mut plans = Vec::new();
        self.plan_record(schema, &KeyPath::default(), 0, &mut plans)?;
        Ok(plans)
    }

    fn bind_record(
        &self,
        record: &mut dyn Schema,
        prefix: &KeyPath,
        depth: usize,
        pass: &mut Pass<'_, '_>,
    ) -> Result<(), BindError> {
        pass.summary.records += 1;

        for field in record.fields() {
            let Field {
                name,
                binding,
                target,
            } = field;
            self.observer.on_event(&BindEvent::FieldVisited {
                name,
                key: binding.key,
            });

            let slot = match target {
                Target::Nested(child) => {
                    let child_prefix = self.child_prefix(prefix, binding.key);
                    self.check_depth(depth + 1, &child_prefix, name)?;
                    self.bind_record(child, &child_prefix, depth + 1, pass)?;
                    continue;
                }
                Target::Leaf(slot) => Some(slot),
                Target::ReadOnly(_) => None,
            };

            let Some(leaf_key) = binding.key else {
                continue;
            };
            let key = prefix.store_key(leaf_key);

            if let Some(env) = binding.env {
                let env_name = prefix.env_name(env, self.options.env_prefix.as_deref());
                self.observer.on_event(&BindEvent::EnvBound {
                    key: &key,
                    env: &env_name,
                });
                pass.store.bind_env(&key, &env_name);
            }

            if let Some(flag_name) = binding.flag
                && let Some(flag) = pass.flags.lookup(flag_name)
            {
                self.observer.on_event(&BindEvent::FlagBound {
                    key: &key,
                    flag: flag_name,
                });
                pass.store.bind_flag(&key, flag);
            }

            let Some(mut slot) = slot else {
                self.observer
                    .on_event(&BindEvent::ReadOnlySkipped { key: &key });
                continue;
            };
            let Some(raw) = pass.store.get(&key) else {
                continue;
            };

            if self.assign(&key, &mut slot, raw.clone())? {
                self.observer.on_event(&BindEvent::ValueSet {
                    key: &key,
                    value: &raw,
                });
                pass.summary.assigned.push((key, raw));
            }
        }

        Ok(())
    }

    /// Returns `false` when the field fell back to its zero value.
    fn assign(&self, key: &str, slot: &mut Slot<'_>, raw: Value) -> Result<bool, BindError> {
        if let Some(caster) = self.casters.get(key) {
            let cast = caster(raw).map_err(|source| BindError::Cast {
                key: key.to_string(),
                source,
            })?;
            // Caster output must already fit the field.
            return slot
                .assign(cast)
                .map(|()| true)
                .map_err(|source| BindError::Cast {
                    key: key.to_string(),
                    source,
                });
        }

        match slot.assign(raw) {
            Ok(()) => Ok(true),
            Err(source) if !slot.has_zero() => Err(BindError::Unassignable {
                key: key.to_string(),
                reason: source.to_string(),
            }),
            Err(source) if self.options.strict => Err(BindError::Coerce {
                key: key.to_string(),
                source,
            }),
            Err(error) => {
                self.observer.on_event(&BindEvent::CoercionFallback { key, error: &error });
                slot.assign_zero();
                Ok(false)
            }
        }
    }

    fn plan_record(
        &self,
        record: &mut dyn Schema,
        prefix: &KeyPath,
        depth: usize,
        plans: &mut Vec<FieldPlan>,
    ) -> Result<(), BindError> {
        for field in record.fields() {
            let (kind, settable) = match field.target {
                Target::Nested(child) => {
                    let child_prefix = self.child_prefix(prefix, field.binding.key);
                    self.check_depth(depth + 1, &child_prefix, field.name)?;
                    self.plan_record(child, &child_prefix, depth + 1, plans)?;
                    continue;
                }
                Target::Leaf(slot) => (slot.kind(), true),
                Target::ReadOnly(kind) => (kind, false),
            };
            let Some(leaf_key) = field.binding.key else {
                continue;
            };
            plans.push(FieldPlan {
                name: field.name,
                store_key: prefix.store_key(leaf_key),
                env_name: field
                    .binding
                    .env
                    .map(|env| prefix.env_name(env, self.options.env_prefix.as_deref())),
                flag: field.binding.flag,
                kind,
                settable,
            });
        }
        Ok(())
    }

    fn child_prefix(&self, prefix: &KeyPath, key: Option<&str>) -> KeyPath {
        match (self.options.use_nesting, key) {
            (true, Some(segment)) => prefix.child(segment),
            (true, None) => prefix.clone(),
            (false, _) => KeyPath::default(),
        }
    }

    fn check_depth(&self, depth: usize, at: &KeyPath, name: &str) -> Result<(), BindError> {
        if depth > self.options.max_depth {
            return Err(BindError::DepthExceeded {
                key: at.store_key(name),
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }
}

struct Pass<'s, 'f> {
    store: &'s mut dyn Store,
    flags: &'f dyn Flags,
    summary: BindSummary,
}
