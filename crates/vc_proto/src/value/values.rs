use core::any::Any;
use core::fmt;
use std::borrow::Cow;

use bytes::Bytes;

use crate::error::ValueError;

/// An owned decoded value.
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    /// An enum number.
    Enum(i32),
    /// An instance produced by a message marshaller.
    Message(Box<dyn Any>),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

/// A borrowed view of a field value, produced by member getters.
#[derive(Clone)]
pub enum ValueRef<'a> {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Enum(i32),
    Message(&'a dyn Any),
    List(Vec<ValueRef<'a>>),
    Map(Vec<(ValueRef<'a>, ValueRef<'a>)>),
    /// An unset field with explicit presence.
    Absent,
}

impl Value {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[inline]
    pub(crate) fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind_name(),
        }
    }

    /// Takes the boxed instance out of a message value.
    pub fn into_message<T: Any>(self) -> Result<T, ValueError> {
        match self {
            Self::Message(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(ValueError::TypeMismatch {
                    expected: core::any::type_name::<T>(),
                    found: "message",
                }),
            },
            other => Err(other.mismatch("message")),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::I32(v) => write!(f, "I32({v})"),
            Self::I64(v) => write!(f, "I64({v})"),
            Self::U32(v) => write!(f, "U32({v})"),
            Self::U64(v) => write!(f, "U64({v})"),
            Self::F32(v) => write!(f, "F32({v})"),
            Self::F64(v) => write!(f, "F64({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Bytes(v) => write!(f, "Bytes({v:?})"),
            Self::Enum(v) => write!(f, "Enum({v})"),
            Self::Message(_) => f.write_str("Message(..)"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
        }
    }
}

impl ValueRef<'_> {
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether the value equals the protobuf zero value of its kind.
    ///
    /// Messages are never considered empty.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(v) => !*v,
            Self::I32(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::U32(v) => *v == 0,
            Self::U64(v) => *v == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
            Self::Enum(v) => *v == 0,
            Self::List(v) => v.is_empty(),
            Self::Map(v) => v.is_empty(),
            Self::Message(_) => false,
            Self::Absent => true,
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::I32(v) => write!(f, "I32({v})"),
            Self::I64(v) => write!(f, "I64({v})"),
            Self::U32(v) => write!(f, "U32({v})"),
            Self::U64(v) => write!(f, "U64({v})"),
            Self::F32(v) => write!(f, "F32({v})"),
            Self::F64(v) => write!(f, "F64({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Bytes(v) => write!(f, "Bytes({v:?})"),
            Self::Enum(v) => write!(f, "Enum({v})"),
            Self::Message(_) => f.write_str("Message(..)"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}
