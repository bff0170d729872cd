use core::any::{Any, TypeId};

use bytes::Bytes;

use super::plan::{Element, FieldPlan, GeneratedMarshaller, Layout, MemberSlot};
use crate::error::{DecodeError, FactoryError, RequiredFieldError, WireError};
use crate::registry::ProtoRegistry;
use crate::schema::{Cardinality, DefaultValue, ScalarKind, ScalarType};
use crate::value::{FieldValues, Value};
use crate::wire::{ProtoReader, Tag, UnknownFieldSet, WireType, decode_zigzag32, decode_zigzag64};

/// Per-field accumulation while reading one message.
enum Slot {
    Empty,
    Single(Value),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

/// An enum number the receiving schema rejects.
struct UnknownEnum(i32);

fn read_scalar(
    reader: &mut ProtoReader<'_>,
    scalar: ScalarType,
    number: u32,
) -> Result<Value, WireError> {
    let value = match scalar {
        ScalarType::Int32 => Value::I32(reader.read_varint()? as i32),
        ScalarType::Int64 => Value::I64(reader.read_varint()? as i64),
        ScalarType::UInt32 => Value::U32(reader.read_varint()? as u32),
        ScalarType::UInt64 => Value::U64(reader.read_varint()?),
        ScalarType::SInt32 => Value::I32(decode_zigzag32(reader.read_varint()? as u32)),
        ScalarType::SInt64 => Value::I64(decode_zigzag64(reader.read_varint()?)),
        ScalarType::Fixed32 => Value::U32(reader.read_fixed32()?),
        ScalarType::Fixed64 => Value::U64(reader.read_fixed64()?),
        ScalarType::SFixed32 => Value::I32(reader.read_fixed32()? as i32),
        ScalarType::SFixed64 => Value::I64(reader.read_fixed64()? as i64),
        ScalarType::Float => Value::F32(f32::from_bits(reader.read_fixed32()?)),
        ScalarType::Double => Value::F64(f64::from_bits(reader.read_fixed64()?)),
        ScalarType::Bool => Value::Bool(reader.read_varint()? != 0),
        ScalarType::String => {
            let bytes = reader.read_length_delimited()?;
            let text = core::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { number })?;
            Value::String(text.to_owned())
        }
        ScalarType::Bytes => Value::Bytes(Bytes::copy_from_slice(reader.read_length_delimited()?)),
    };
    Ok(value)
}

/// The zero value of an element, used for map entries missing a half.
fn zero_value(
    registry: &ProtoRegistry,
    reader: &ProtoReader<'_>,
    plan: &FieldPlan,
    element: Element,
) -> Result<Value, DecodeError> {
    let value = match element {
        Element::Scalar(scalar) => match scalar.kind() {
            ScalarKind::I32 => Value::I32(0),
            ScalarKind::I64 => Value::I64(0),
            ScalarKind::U32 => Value::U32(0),
            ScalarKind::U64 => Value::U64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::String => Value::String(String::new()),
            ScalarKind::Bytes => Value::Bytes(Bytes::new()),
        },
        Element::Enum { .. } => Value::Enum(0),
        Element::Message { target } => {
            let marshaller = message_marshaller(registry, target, plan)?;
            Value::Message(marshaller.read(registry, &mut reader.nested(&[])?)?)
        }
    };
    Ok(value)
}

fn default_value(element: Element, default: &DefaultValue) -> Option<Value> {
    use ScalarKind as K;

    let value = match (element, default) {
        (Element::Enum { .. }, DefaultValue::Enum { number, .. }) => Value::Enum(*number),
        (Element::Scalar(scalar), default) => match (scalar.kind(), default) {
            (K::Bool, DefaultValue::Bool(b)) => Value::Bool(*b),
            (K::I32, DefaultValue::Int(i)) => Value::I32(*i as i32),
            (K::I64, DefaultValue::Int(i)) => Value::I64(*i),
            (K::U32, DefaultValue::UInt(u)) => Value::U32(*u as u32),
            (K::U64, DefaultValue::UInt(u)) => Value::U64(*u),
            (K::F32, DefaultValue::Float(f)) => Value::F32(*f as f32),
            (K::F64, DefaultValue::Float(f)) => Value::F64(*f),
            (K::String, DefaultValue::String(s)) => Value::String(s.clone()),
            (K::Bytes, DefaultValue::Bytes(b)) => Value::Bytes(Bytes::from(b.clone())),
            _ => return None,
        },
        _ => return None,
    };
    Some(value)
}

fn message_marshaller<'r>(
    registry: &'r ProtoRegistry,
    target: TypeId,
    plan: &FieldPlan,
) -> Result<&'r dyn super::MessageMarshaller, DecodeError> {
    registry
        .message_marshaller(target)
        .map(|m| &**m)
        .ok_or_else(|| DecodeError::UnknownType(plan.unresolved()))
}

impl GeneratedMarshaller {
    fn read_element(
        &self,
        registry: &ProtoRegistry,
        reader: &mut ProtoReader<'_>,
        plan: &FieldPlan,
        element: Element,
    ) -> Result<Result<Value, UnknownEnum>, DecodeError> {
        let value = match element {
            Element::Scalar(scalar) => read_scalar(reader, scalar, plan.number)?,
            Element::Enum { target, open } => {
                let number = reader.read_varint()? as i32;
                if !open {
                    let known = registry
                        .enum_marshaller(target)
                        .ok_or_else(|| DecodeError::UnknownType(plan.unresolved()))?
                        .is_known(number);
                    if !known {
                        return Ok(Err(UnknownEnum(number)));
                    }
                }
                Value::Enum(number)
            }
            Element::Message { target } => {
                let frame = reader.read_length_delimited()?;
                let mut nested = reader.nested(frame)?;
                let marshaller = message_marshaller(registry, target, plan)?;
                Value::Message(marshaller.read(registry, &mut nested)?)
            }
        };
        Ok(Ok(value))
    }

    fn read_map_entry(
        &self,
        registry: &ProtoRegistry,
        mut reader: ProtoReader<'_>,
        plan: &FieldPlan,
        key_type: ScalarType,
    ) -> Result<Option<(Value, Value)>, DecodeError> {
        let mut key = None;
        let mut value = None;
        while !reader.is_empty() {
            let tag = reader.read_tag()?;
            match tag.number {
                1 => {
                    expect_wire_type(tag, key_type.wire_type())?;
                    key = Some(read_scalar(&mut reader, key_type, plan.number)?);
                }
                2 => {
                    expect_wire_type(tag, plan.element.wire_type())?;
                    match self.read_element(registry, &mut reader, plan, plan.element)? {
                        Ok(v) => value = Some(v),
                        Err(UnknownEnum(_)) => return Ok(None),
                    }
                }
                _ => reader.skip(tag.wire_type)?,
            }
        }
        let key = match key {
            Some(key) => key,
            None => zero_value(registry, &reader, plan, Element::Scalar(key_type))?,
        };
        let value = match value {
            Some(value) => value,
            None => zero_value(registry, &reader, plan, plan.element)?,
        };
        Ok(Some((key, value)))
    }

    pub(super) fn decode(
        &self,
        registry: &ProtoRegistry,
        reader: &mut ProtoReader<'_>,
    ) -> Result<Box<dyn Any>, DecodeError> {
        let mut slots: Vec<Slot> = self.fields.iter().map(|_| Slot::Empty).collect();
        let mut unknown = UnknownFieldSet::new();

        while !reader.is_empty() {
            let mark = reader.mark();
            let tag = reader.read_tag()?;
            let Some(&index) = self.by_number.get(&tag.number) else {
                reader.skip(tag.wire_type)?;
                log::trace!("`{}` keeps unknown field {}", self.layout.type_path, tag.number);
                unknown.push_raw(reader.consumed_since(mark));
                continue;
            };
            let plan = &self.fields[index];

            match plan.cardinality {
                Cardinality::Map => {
                    expect_wire_type(tag, WireType::LengthDelimited)?;
                    let frame = reader.read_length_delimited()?;
                    let entry = reader.frame(frame);
                    let key_type = plan.map_key.unwrap_or(ScalarType::String);
                    match self.read_map_entry(registry, entry, plan, key_type)? {
                        Some(entry) => match &mut slots[index] {
                            Slot::Map(entries) => entries.push(entry),
                            slot => *slot = Slot::Map(vec![entry]),
                        },
                        None => {
                            log::warn!(
                                "`{}`: map entry of `{}` with an unknown enum value moved to unknown fields",
                                self.layout.type_path,
                                plan.name
                            );
                            unknown.push_raw(reader.consumed_since(mark));
                        }
                    }
                }
                Cardinality::Repeated => {
                    let element_wire = plan.element.wire_type();
                    let mut values = Vec::new();
                    let packed_input = tag.wire_type == WireType::LengthDelimited
                        && element_wire != WireType::LengthDelimited;
                    if packed_input {
                        let frame = reader.read_length_delimited()?;
                        let mut packed = reader.frame(frame);
                        while !packed.is_empty() {
                            match self.read_element(registry, &mut packed, plan, plan.element)? {
                                Ok(v) => values.push(v),
                                Err(UnknownEnum(n)) => {
                                    unknown.push_varint(plan.number, n as i64 as u64)
                                }
                            }
                        }
                    } else {
                        expect_wire_type(tag, element_wire)?;
                        match self.read_element(registry, reader, plan, plan.element)? {
                            Ok(v) => values.push(v),
                            Err(UnknownEnum(_)) => unknown.push_raw(reader.consumed_since(mark)),
                        }
                    }
                    match &mut slots[index] {
                        Slot::List(list) => list.extend(values),
                        slot => *slot = Slot::List(values),
                    }
                }
                Cardinality::Required | Cardinality::Optional => {
                    expect_wire_type(tag, plan.element.wire_type())?;
                    match self.read_element(registry, reader, plan, plan.element)? {
                        Ok(value) => {
                            if let Some(group) = plan.oneof {
                                for &sibling in &self.oneof_members[group] {
                                    slots[sibling] = Slot::Empty;
                                }
                            }
                            slots[index] = Slot::Single(value);
                        }
                        Err(UnknownEnum(n)) => {
                            log::warn!(
                                "`{}`: unknown value {n} of `{}` moved to unknown fields",
                                self.layout.type_path,
                                plan.name
                            );
                            unknown.push_raw(reader.consumed_since(mark));
                        }
                    }
                }
            }
        }

        let mut values: Vec<Option<Value>> = Vec::with_capacity(slots.len());
        for (plan, slot) in self.fields.iter().zip(slots) {
            let value = match slot {
                Slot::Single(v) => Some(v),
                Slot::List(list) => Some(Value::List(list)),
                Slot::Map(entries) => Some(Value::Map(entries)),
                Slot::Empty => match plan.cardinality {
                    Cardinality::Repeated => Some(Value::List(Vec::new())),
                    Cardinality::Map => Some(Value::Map(Vec::new())),
                    Cardinality::Required => {
                        return Err(RequiredFieldError {
                            type_name: self.descriptor.qualified_name().to_owned(),
                            field: plan.name.clone(),
                        }
                        .into());
                    }
                    Cardinality::Optional => plan
                        .default
                        .as_ref()
                        .and_then(|d| default_value(plan.element, d)),
                },
            };
            values.push(value);
        }

        if !unknown.is_empty() && self.layout.unknown.is_none() {
            log::warn!(
                "`{}` cannot hold unknown fields, dropping {} bytes",
                self.layout.type_path,
                unknown.as_bytes().len()
            );
        }
        assemble(&self.layout, &mut values, Some(unknown)).map_err(DecodeError::from)
    }
}

fn expect_wire_type(tag: Tag, expected: WireType) -> Result<(), WireError> {
    if tag.wire_type == expected {
        Ok(())
    } else {
        Err(WireError::WireTypeMismatch {
            number: tag.number,
            expected,
            found: tag.wire_type,
        })
    }
}

// Builds flattened supertypes bottom-up, then the instance itself.
fn assemble(
    layout: &Layout,
    values: &mut [Option<Value>],
    unknown: Option<UnknownFieldSet>,
) -> Result<Box<dyn Any>, FactoryError> {
    let mut field_values = FieldValues::new(layout.type_path.clone(), layout.names.clone());
    for (index, member) in layout.members.iter().enumerate() {
        match member {
            MemberSlot::Field { plan, .. } => {
                if let Some(value) = values.get_mut(*plan).and_then(Option::take) {
                    field_values.set(index, value);
                }
            }
            MemberSlot::Flatten { layout: parent, .. } => {
                let instance = assemble(parent, values, None)?;
                field_values.set(index, Value::Message(instance));
            }
        }
    }
    if let Some(unknown) = unknown {
        field_values.set_unknown(unknown);
    }
    (layout.factory)(field_values)
}
