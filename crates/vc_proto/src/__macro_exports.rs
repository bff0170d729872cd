//! Items the derive output refers to. Not public API.

pub use core::any::Any;
pub use core::option::Option;
pub use core::result::Result;
pub use std::borrow::Cow;
pub use std::boxed::Box;
pub use std::vec::Vec;

use crate::error::ValueError;
use crate::value::{ProtoEnum, Value, ValueRef};

/// Converts a decoded enum number for a closed enum.
pub fn enum_from_value<E: ProtoEnum>(value: Value) -> Result<E, ValueError> {
    match value {
        Value::Enum(number) => E::from_number(number).ok_or(ValueError::UnknownEnumValue {
            type_path: core::any::type_name::<E>(),
            value: number,
        }),
        other => Err(other.mismatch("enum")),
    }
}

/// Borrows a foreign field held in an `Option`.
pub fn foreign_opt<T: Any>(value: &Option<T>) -> ValueRef<'_> {
    match value {
        Some(inner) => ValueRef::Message(inner),
        None => ValueRef::Absent,
    }
}

/// Borrows a foreign field held in a `Vec`.
pub fn foreign_vec<T: Any>(values: &[T]) -> ValueRef<'_> {
    ValueRef::List(values.iter().map(|v| ValueRef::Message(v as &dyn Any)).collect())
}
