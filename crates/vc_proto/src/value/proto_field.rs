use core::hash::{BuildHasher, Hash};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use super::{Value, ValueRef};
use crate::error::ValueError;
use crate::info::{FieldType, TypeRef, Typed};
use crate::schema::ScalarType;

// -----------------------------------------------------------------------------
// ProtoField

/// A native type that can be stored in a message field.
///
/// Implemented for the scalar types, containers of field types, and by
/// `#[derive(ProtoMessage)]` / `#[derive(ProtoEnum)]`.
///
/// | Rust | protobuf |
/// |------|----------|
/// | `bool` | `bool` |
/// | `i32` / `i64` | `int32` / `int64` (or `sint*`, `sfixed*`) |
/// | `u32` / `u64` | `uint32` / `uint64` (or `fixed*`) |
/// | `f32` / `f64` | `float` / `double` |
/// | `String` | `string` |
/// | [`Bytes`] | `bytes` |
/// | `Option<T>` | optional `T` with presence |
/// | `Vec<T>` | repeated `T` |
/// | `HashMap<K, V>` / `BTreeMap<K, V>` | `map<K, V>` |
/// | `Box<T>` | `T` |
pub trait ProtoField: Sized + 'static {
    fn field_type() -> FieldType;

    fn to_value(&self) -> ValueRef<'_>;

    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// The value of a field that never appeared on the wire and declares no
    /// default. `None` means absence is an error.
    #[inline]
    fn missing() -> Option<Self> {
        None
    }
}

macro_rules! impl_scalar {
    ($ty:ty, $scalar:ident, $variant:ident, $name:literal) => {
        impl ProtoField for $ty {
            #[inline]
            fn field_type() -> FieldType {
                FieldType::Scalar(ScalarType::$scalar)
            }

            #[inline]
            fn to_value(&self) -> ValueRef<'_> {
                ValueRef::$variant(*self)
            }

            #[inline]
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other.mismatch($name)),
                }
            }

            #[inline]
            fn missing() -> Option<Self> {
                Some(<$ty>::default())
            }
        }
    };
}

impl_scalar!(bool, Bool, Bool, "bool");
impl_scalar!(i32, Int32, I32, "i32");
impl_scalar!(i64, Int64, I64, "i64");
impl_scalar!(u32, UInt32, U32, "u32");
impl_scalar!(u64, UInt64, U64, "u64");
impl_scalar!(f32, Float, F32, "f32");
impl_scalar!(f64, Double, F64, "f64");

impl ProtoField for String {
    #[inline]
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    #[inline]
    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::String(Cow::Borrowed(self.as_str()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(String::new())
    }
}

impl ProtoField for Bytes {
    #[inline]
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::Bytes)
    }

    #[inline]
    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::Bytes(Cow::Borrowed(&self[..]))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(other.mismatch("bytes")),
        }
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(Bytes::new())
    }
}

// -----------------------------------------------------------------------------
// Containers

impl<T: ProtoField> ProtoField for Option<T> {
    fn field_type() -> FieldType {
        FieldType::Optional(Box::new(T::field_type()))
    }

    fn to_value(&self) -> ValueRef<'_> {
        match self {
            Some(v) => v.to_value(),
            None => ValueRef::Absent,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Some)
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: ProtoField> ProtoField for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn to_value(&self) -> ValueRef<'_> {
        T::to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Box::new)
    }

    fn missing() -> Option<Self> {
        T::missing().map(Box::new)
    }
}

impl<T: ProtoField> ProtoField for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Repeated(Box::new(T::field_type()))
    }

    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::List(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other.mismatch("list")),
        }
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<K, V, S> ProtoField for HashMap<K, V, S>
where
    K: ProtoField + Eq + Hash,
    V: ProtoField,
    S: BuildHasher + Default + 'static,
{
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(K::field_type()), Box::new(V::field_type()))
    }

    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    // Later entries replace earlier ones with the same key.
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(other.mismatch("map")),
        }
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(HashMap::default())
    }
}

impl<K, V> ProtoField for BTreeMap<K, V>
where
    K: ProtoField + Ord,
    V: ProtoField,
{
    fn field_type() -> FieldType {
        FieldType::Map(Box::new(K::field_type()), Box::new(V::field_type()))
    }

    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(other.mismatch("map")),
        }
    }

    #[inline]
    fn missing() -> Option<Self> {
        Some(BTreeMap::new())
    }
}

// -----------------------------------------------------------------------------
// Enums

/// A native enum with a schema counterpart.
///
/// Implemented by `#[derive(ProtoEnum)]`.
pub trait ProtoEnum: ProtoField + Typed {
    fn from_number(number: i32) -> Option<Self>;

    fn number(&self) -> i32;
}

/// An enum field that keeps numbers the native enum does not know.
///
/// A plain enum field routes such numbers to the unknown fields instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenEnum<E> {
    Known(E),
    Unknown(i32),
}

impl<E: ProtoEnum> OpenEnum<E> {
    pub fn number(&self) -> i32 {
        match self {
            Self::Known(e) => e.number(),
            Self::Unknown(n) => *n,
        }
    }

    pub fn known(&self) -> Option<&E> {
        match self {
            Self::Known(e) => Some(e),
            Self::Unknown(_) => None,
        }
    }
}

impl<E: ProtoEnum> From<E> for OpenEnum<E> {
    #[inline]
    fn from(value: E) -> Self {
        Self::Known(value)
    }
}

impl<E: ProtoEnum> ProtoField for OpenEnum<E> {
    fn field_type() -> FieldType {
        FieldType::Enum {
            ty: TypeRef::of::<E>(),
            open: true,
        }
    }

    fn to_value(&self) -> ValueRef<'_> {
        ValueRef::Enum(self.number())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Enum(n) => Ok(E::from_number(n).map_or(Self::Unknown(n), Self::Known)),
            other => Err(other.mismatch("enum")),
        }
    }

    fn missing() -> Option<Self> {
        E::missing().map(Self::Known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_convert() {
        assert_eq!(i32::from_value(Value::I32(-4)), Ok(-4));
        assert_eq!(
            i32::from_value(Value::U32(4)),
            Err(ValueError::TypeMismatch {
                expected: "i32",
                found: "u32"
            })
        );
        assert_eq!(String::missing(), Some(String::new()));
        assert!(matches!(7u64.to_value(), ValueRef::U64(7)));
    }

    #[test]
    fn containers_convert() {
        let list = Value::List(vec![Value::String("a".into()), Value::String("b".into())]);
        assert_eq!(Vec::<String>::from_value(list), Ok(vec!["a".to_owned(), "b".to_owned()]));

        let map = Value::Map(vec![
            (Value::U32(1), Value::Bool(false)),
            (Value::U32(1), Value::Bool(true)),
        ]);
        let map = BTreeMap::<u32, bool>::from_value(map).unwrap();
        assert_eq!(map.get(&1), Some(&true));

        assert_eq!(Option::<i64>::missing(), Some(None));
        assert!(Option::<i64>::None.to_value().is_absent());
        assert_eq!(
            <Option<Box<i32>>>::field_type(),
            FieldType::Optional(Box::new(FieldType::Scalar(ScalarType::Int32)))
        );
    }
}
