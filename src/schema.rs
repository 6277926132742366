//! Schema descriptors: how a config struct exposes its fields to the binder.
//!
//! A record implements [`Schema`] by listing its fields in declaration order.
//! Each [`Field`] carries a display name, a [`Binding`] (store key, env var,
//! flag) and a target: a typed [`Slot`] borrowed from the struct, a nested
//! record, or a read-only marker.
//!
//! ```ignore
//! impl Schema for ServerConfig {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::leaf("host", &mut self.host).key("host").env("HOST"),
//!             Field::leaf("port", &mut self.port).key("port").flag("port"),
//!             Field::nested("tls", &mut self.tls).key("tls"),
//!         ]
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use toml::Value;

use crate::cast;
use crate::error::{BindError, CastError};

/// A record type whose fields can be bound from config sources.
pub trait Schema {
    /// Describe every field, in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;

    /// Reset the record to its declared defaults.
    ///
    /// Called once on the root record before traversal when the binder has
    /// [`apply_defaults`](crate::BindOptions::apply_defaults) enabled. Any
    /// error aborts the bind pass.
    fn apply_defaults(&mut self) -> Result<(), BindError> {
        Ok(())
    }
}

/// Per-field binding annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binding {
    /// Name in the layered store namespace. Leaves without one are never bound.
    pub key: Option<&'static str>,
    /// Name of a command-line flag that overrides the store value.
    pub flag: Option<&'static str>,
    /// Environment variable name, before prefixing.
    pub env: Option<&'static str>,
}

/// Target type tag of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    String,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Timestamp,
    Duration,
    StringSeq,
    IntSeq,
    ValueSeq,
    /// Untyped; takes the store value as-is.
    Raw,
    /// `Option` of a built-in kind.
    Optional(&'static Kind),
    /// Deserialized with serde; the escape hatch for record-valued fields.
    Custom(&'static str),
}

/// Deserialize-on-assign slot for types the built-in kinds don't cover.
pub struct CustomSlot<'a> {
    type_name: &'static str,
    assign: Box<dyn FnMut(Value) -> Result<(), CastError> + 'a>,
}

impl fmt::Debug for CustomSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSlot")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Slot for `Option<T>` where `T` is a built-in kind. Zero is `None`.
pub struct OptionalSlot<'a> {
    kind: &'static Kind,
    assign: Box<dyn FnMut(Option<&Value>) -> Result<(), CastError> + 'a>,
}

impl fmt::Debug for OptionalSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalSlot")
            .field("kind", self.kind)
            .finish_non_exhaustive()
    }
}

/// Mutable borrow of a leaf field, tagged by type.
#[derive(Debug)]
pub enum Slot<'a> {
    Bool(&'a mut bool),
    String(&'a mut String),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Timestamp(&'a mut DateTime<Utc>),
    Duration(&'a mut Duration),
    StringSeq(&'a mut Vec<String>),
    IntSeq(&'a mut Vec<i64>),
    ValueSeq(&'a mut Vec<Value>),
    Raw(&'a mut Value),
    Optional(OptionalSlot<'a>),
    Custom(CustomSlot<'a>),
}

macro_rules! slot_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a mut $ty> for Slot<'a> {
                fn from(target: &'a mut $ty) -> Self {
                    Slot::$variant(target)
                }
            }
        )*
    };
}

slot_from! {
    bool => Bool,
    String => String,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    DateTime<Utc> => Timestamp,
    Duration => Duration,
    Vec<String> => StringSeq,
    Vec<i64> => IntSeq,
    Vec<Value> => ValueSeq,
    Value => Raw,
}

/// Built-in leaf types, convertible with the permissive rules in [`cast`].
///
/// Every implementor can also be bound as `Option<T>`.
pub trait Coerce: Sized {
    const KIND: &'static Kind;

    fn coerce(value: &Value) -> Result<Self, CastError>;
}

macro_rules! coerce_with {
    ($($ty:ty => $variant:ident, $conv:expr);* $(;)?) => {
        $(
            impl Coerce for $ty {
                const KIND: &'static Kind = &Kind::$variant;

                fn coerce(value: &Value) -> Result<Self, CastError> {
                    ($conv)(value)
                }
            }
        )*
    };
}

coerce_with! {
    bool => Bool, cast::try_to_bool;
    String => String, cast::try_to_string;
    i8 => I8, cast::try_to_signed::<i8>;
    i16 => I16, cast::try_to_signed::<i16>;
    i32 => I32, cast::try_to_signed::<i32>;
    i64 => I64, cast::try_to_i64;
    isize => Isize, cast::try_to_signed::<isize>;
    u8 => U8, cast::try_to_unsigned::<u8>;
    u16 => U16, cast::try_to_unsigned::<u16>;
    u32 => U32, cast::try_to_unsigned::<u32>;
    u64 => U64, cast::try_to_u64;
    usize => Usize, cast::try_to_unsigned::<usize>;
    f32 => F32, cast::try_to_f32;
    f64 => F64, cast::try_to_f64;
    DateTime<Utc> => Timestamp, cast::try_to_timestamp;
    Duration => Duration, cast::try_to_duration;
    Vec<String> => StringSeq, cast::try_to_string_seq;
    Vec<i64> => IntSeq, cast::try_to_int_seq;
}

impl<'a, T: Coerce + 'a> From<&'a mut Option<T>> for Slot<'a> {
    fn from(target: &'a mut Option<T>) -> Self {
        Slot::Optional(OptionalSlot {
            kind: T::KIND,
            assign: Box::new(move |value: Option<&Value>| {
                *target = value.map(T::coerce).transpose()?;
                Ok(())
            }),
        })
    }
}

impl<'a> Slot<'a> {
    /// Slot for any `DeserializeOwned` type, e.g. `Vec<Upstream>` or `Option<String>`.
    pub fn custom<T: DeserializeOwned + 'a>(target: &'a mut T) -> Self {
        Slot::Custom(CustomSlot {
            type_name: std::any::type_name::<T>(),
            assign: Box::new(move |value: Value| {
                *target = value
                    .try_into::<T>()
                    .map_err(|e| CastError::new(e.to_string()))?;
                Ok(())
            }),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Slot::Bool(_) => Kind::Bool,
            Slot::String(_) => Kind::String,
            Slot::I8(_) => Kind::I8,
            Slot::I16(_) => Kind::I16,
            Slot::I32(_) => Kind::I32,
            Slot::I64(_) => Kind::I64,
            Slot::Isize(_) => Kind::Isize,
            Slot::U8(_) => Kind::U8,
            Slot::U16(_) => Kind::U16,
            Slot::U32(_) => Kind::U32,
            Slot::U64(_) => Kind::U64,
            Slot::Usize(_) => Kind::Usize,
            Slot::F32(_) => Kind::F32,
            Slot::F64(_) => Kind::F64,
            Slot::Timestamp(_) => Kind::Timestamp,
            Slot::Duration(_) => Kind::Duration,
            Slot::StringSeq(_) => Kind::StringSeq,
            Slot::IntSeq(_) => Kind::IntSeq,
            Slot::ValueSeq(_) => Kind::ValueSeq,
            Slot::Raw(_) => Kind::Raw,
            Slot::Optional(o) => Kind::Optional(o.kind),
            Slot::Custom(c) => Kind::Custom(c.type_name),
        }
    }

    /// Whether a failed conversion can fall back to the type's zero value.
    pub fn has_zero(&self) -> bool {
        !matches!(self, Slot::Custom(_))
    }

    /// Convert `value` to the slot's type and store it. On error the slot is unchanged.
    pub fn assign(&mut self, value: Value) -> Result<(), CastError> {
        match self {
            Slot::Bool(t) => **t = cast::try_to_bool(&value)?,
            Slot::String(t) => **t = cast::try_to_string(&value)?,
            Slot::I8(t) => **t = cast::try_to_signed(&value)?,
            Slot::I16(t) => **t = cast::try_to_signed(&value)?,
            Slot::I32(t) => **t = cast::try_to_signed(&value)?,
            Slot::I64(t) => **t = cast::try_to_i64(&value)?,
            Slot::Isize(t) => **t = cast::try_to_signed(&value)?,
            Slot::U8(t) => **t = cast::try_to_unsigned(&value)?,
            Slot::U16(t) => **t = cast::try_to_unsigned(&value)?,
            Slot::U32(t) => **t = cast::try_to_unsigned(&value)?,
            Slot::U64(t) => **t = cast::try_to_u64(&value)?,
            Slot::Usize(t) => **t = cast::try_to_unsigned(&value)?,
            Slot::F32(t) => **t = cast::try_to_f32(&value)?,
            Slot::F64(t) => **t = cast::try_to_f64(&value)?,
            Slot::Timestamp(t) => **t = cast::try_to_timestamp(&value)?,
            Slot::Duration(t) => **t = cast::try_to_duration(&value)?,
            Slot::StringSeq(t) => **t = cast::try_to_string_seq(&value)?,
            Slot::IntSeq(t) => **t = cast::try_to_int_seq(&value)?,
            Slot::ValueSeq(t) => **t = cast::try_to_value_seq(&value)?,
            Slot::Raw(t) => **t = value,
            Slot::Optional(o) => (o.assign)(Some(&value))?,
            Slot::Custom(c) => (c.assign)(value)?,
        }
        Ok(())
    }

    /// Store the type's zero value. Custom slots are left untouched.
    ///
    /// Timestamps reset to the Unix epoch and optional slots to `None`.
    pub fn assign_zero(&mut self) {
        match self {
            Slot::Bool(t) => **t = false,
            Slot::String(t) => t.clear(),
            Slot::I8(t) => **t = 0,
            Slot::I16(t) => **t = 0,
            Slot::I32(t) => **t = 0,
            Slot::I64(t) => **t = 0,
            Slot::Isize(t) => **t = 0,
            Slot::U8(t) => **t = 0,
            Slot::U16(t) => **t = 0,
            Slot::U32(t) => **t = 0,
            Slot::U64(t) => **t = 0,
            Slot::Usize(t) => **t = 0,
            Slot::F32(t) => **t = 0.0,
            Slot::F64(t) => **t = 0.0,
            Slot::Timestamp(t) => **t = DateTime::<Utc>::default(),
            Slot::Duration(t) => **t = Duration::ZERO,
            Slot::StringSeq(t) => t.clear(),
            Slot::IntSeq(t) => t.clear(),
            Slot::ValueSeq(t) => t.clear(),
            Slot::Optional(o) => {
                // Clearing cannot fail.
                let _ = (o.assign)(None);
            }
            Slot::Raw(_) | Slot::Custom(_) => {}
        }
    }
}

/// What a field points at.
pub enum Target<'a> {
    Leaf(Slot<'a>),
    Nested(&'a mut dyn Schema),
    /// Declared but not settable; registration still happens, assignment is skipped.
    ReadOnly(Kind),
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Leaf(slot) => f.debug_tuple("Leaf").field(&slot.kind()).finish(),
            Target::Nested(_) => f.write_str("Nested"),
            Target::ReadOnly(kind) => f.debug_tuple("ReadOnly").field(kind).finish(),
        }
    }
}

/// One entry of a record's descriptor.
#[derive(Debug)]
pub struct Field<'a> {
    pub name: &'static str,
    pub binding: Binding,
    pub target: Target<'a>,
}

impl<'a> Field<'a> {
    pub fn leaf(name: &'static str, slot: impl Into<Slot<'a>>) -> Self {
        Self::with_target(name, Target::Leaf(slot.into()))
    }

    pub fn nested(name: &'static str, record: &'a mut dyn Schema) -> Self {
        Self::with_target(name, Target::Nested(record))
    }

    pub fn read_only(name: &'static str, kind: Kind) -> Self {
        Self::with_target(name, Target::ReadOnly(kind))
    }

    fn with_target(name: &'static str, target: Target<'a>) -> Self {
        Field {
            name,
            binding: Binding::default(),
            target,
        }
    }

    /// Store key. For nested records this is the key path segment.
    pub fn key(mut self, key: &'static str) -> Self {
        self.binding.key = Some(key);
        self
    }

    pub fn env(mut self, env: &'static str) -> Self {
        self.binding.env = Some(env);
        self
    }

    pub fn flag(mut self, flag: &'static str) -> Self {
        self.binding.flag = Some(flag);
        self
    }
}
