use core::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use super::{ProtoField, Value};
use crate::error::FactoryError;
use crate::wire::UnknownFieldSet;

/// Decoded member values, handed to a type's factory.
///
/// Slots follow member declaration order. A slot is empty when the field
/// never appeared on the wire and declares no default; [`FieldValues::take`]
/// then falls back to [`ProtoField::missing`].
pub struct FieldValues {
    type_path: Cow<'static, str>,
    names: Arc<[Cow<'static, str>]>,
    slots: Vec<Option<Value>>,
    unknown: UnknownFieldSet,
}

impl FieldValues {
    pub(crate) fn new(type_path: Cow<'static, str>, names: Arc<[Cow<'static, str>]>) -> Self {
        let slots = core::iter::repeat_with(|| None).take(names.len()).collect();
        Self {
            type_path,
            names,
            slots,
            unknown: UnknownFieldSet::new(),
        }
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        self.slots[index] = Some(value);
    }

    pub(crate) fn set_unknown(&mut self, unknown: UnknownFieldSet) {
        self.unknown = unknown;
    }

    #[inline]
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// Number of member slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the member at `index` received a value.
    pub fn is_set(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn member_name(&self, index: usize) -> String {
        self.names
            .get(index)
            .map_or_else(|| format!("#{index}"), |n| n.to_string())
    }

    fn no_such_member(&self, member: String) -> FactoryError {
        FactoryError::NoSuchMember {
            type_path: self.type_path.to_string(),
            member,
        }
    }

    /// Takes the raw value of the member at `index`.
    pub fn take_value(&mut self, index: usize) -> Result<Option<Value>, FactoryError> {
        match self.slots.get_mut(index) {
            Some(slot) => Ok(slot.take()),
            None => Err(self.no_such_member(format!("#{index}"))),
        }
    }

    /// Takes and converts the member at `index`.
    pub fn take<T: ProtoField>(&mut self, index: usize) -> Result<T, FactoryError> {
        match self.take_value(index)? {
            Some(value) => T::from_value(value).map_err(|source| FactoryError::Value {
                type_path: self.type_path.to_string(),
                member: self.member_name(index),
                source,
            }),
            None => T::missing().ok_or_else(|| FactoryError::MissingValue {
                type_path: self.type_path.to_string(),
                member: self.member_name(index),
            }),
        }
    }

    /// Takes and converts the member called `name`.
    pub fn take_named<T: ProtoField>(&mut self, name: &str) -> Result<T, FactoryError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| self.no_such_member(name.to_owned()))?;
        self.take(index)
    }

    /// Takes a member whose type is only known to an adapter.
    pub fn take_foreign<T: Any>(&mut self, index: usize) -> Result<T, FactoryError> {
        match self.take_foreign_opt(index)? {
            Some(value) => Ok(value),
            None => Err(FactoryError::MissingValue {
                type_path: self.type_path.to_string(),
                member: self.member_name(index),
            }),
        }
    }

    pub fn take_foreign_opt<T: Any>(&mut self, index: usize) -> Result<Option<T>, FactoryError> {
        match self.take_value(index)? {
            Some(value) => value.into_message().map(Some).map_err(|source| FactoryError::Value {
                type_path: self.type_path.to_string(),
                member: self.member_name(index),
                source,
            }),
            None => Ok(None),
        }
    }

    pub fn take_foreign_vec<T: Any>(&mut self, index: usize) -> Result<Vec<T>, FactoryError> {
        let wrap = |this: &Self, source| FactoryError::Value {
            type_path: this.type_path.to_string(),
            member: this.member_name(index),
            source,
        };
        match self.take_value(index)? {
            Some(Value::List(items)) => items
                .into_iter()
                .map(|item| item.into_message().map_err(|e| wrap(self, e)))
                .collect(),
            Some(other) => Err(wrap(self, other.mismatch("list"))),
            None => Ok(Vec::new()),
        }
    }

    /// Takes the fields the schema did not recognize.
    #[inline]
    pub fn take_unknown_fields(&mut self) -> UnknownFieldSet {
        core::mem::take(&mut self.unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> FieldValues {
        let names: Arc<[Cow<'static, str>]> =
            Arc::from(vec![Cow::Borrowed("id"), Cow::Borrowed("tags")]);
        FieldValues::new(Cow::Borrowed("demo::Person"), names)
    }

    #[test]
    fn take_falls_back_to_missing() {
        let mut values = values();
        values.set(0, Value::I32(7));
        assert_eq!(values.take::<i32>(0), Ok(7));
        assert_eq!(values.take_named::<Vec<String>>("tags"), Ok(Vec::new()));
        assert_eq!(
            values.take::<Box<Vec<i32>>>(0).map(|v| v.len()),
            Ok(0),
            "slot was consumed by the first take"
        );
    }

    #[test]
    fn reports_bad_members() {
        let mut values = values();
        assert!(matches!(
            values.take_named::<i32>("name"),
            Err(FactoryError::NoSuchMember { .. })
        ));
        values.set(1, Value::Bool(true));
        assert!(matches!(
            values.take::<Vec<String>>(1),
            Err(FactoryError::Value { .. })
        ));
        assert!(matches!(
            values.take_foreign::<u8>(0),
            Err(FactoryError::MissingValue { .. })
        ));
    }
}
