use core::any::Any;

use super::plan::{Element, FieldPlan, GeneratedMarshaller};
use crate::error::{EncodeError, RequiredFieldError};
use crate::registry::ProtoRegistry;
use crate::schema::{Cardinality, DefaultValue, ScalarType};
use crate::value::ValueRef;
use crate::wire::{ProtoWriter, WireType, encode_zigzag32, encode_zigzag64};

// Implicit-presence fields equal to their default are not written. An enum
// without a declared default is always written: its absent value is the
// first declared one, which need not be zero.
fn is_default(value: &ValueRef<'_>, default: Option<&DefaultValue>) -> bool {
    let Some(default) = default else {
        return !matches!(value, ValueRef::Enum(_)) && value.is_zero();
    };
    match (value, default) {
        (ValueRef::Bool(v), DefaultValue::Bool(d)) => v == d,
        (ValueRef::I32(v), DefaultValue::Int(d)) => i64::from(*v) == *d,
        (ValueRef::I64(v), DefaultValue::Int(d)) => v == d,
        (ValueRef::U32(v), DefaultValue::UInt(d)) => u64::from(*v) == *d,
        (ValueRef::U64(v), DefaultValue::UInt(d)) => v == d,
        (ValueRef::F32(v), DefaultValue::Float(d)) => *v == *d as f32,
        (ValueRef::F64(v), DefaultValue::Float(d)) => v == d,
        (ValueRef::String(v), DefaultValue::String(d)) => v == d,
        (ValueRef::Bytes(v), DefaultValue::Bytes(d)) => **v == **d,
        (ValueRef::Enum(v), DefaultValue::Enum { number, .. }) => v == number,
        _ => false,
    }
}

impl GeneratedMarshaller {
    fn mismatch(&self, plan: &FieldPlan) -> EncodeError {
        EncodeError::ValueMismatch {
            type_name: self.descriptor.qualified_name().to_owned(),
            field: plan.name.clone(),
        }
    }

    fn write_scalar(
        &self,
        writer: &mut ProtoWriter,
        plan: &FieldPlan,
        scalar: ScalarType,
        value: &ValueRef<'_>,
    ) -> Result<(), EncodeError> {
        match (scalar, value) {
            (ScalarType::Int32, ValueRef::I32(v)) => writer.write_varint(*v as i64 as u64),
            (ScalarType::SInt32, ValueRef::I32(v)) => {
                writer.write_varint(encode_zigzag32(*v).into())
            }
            (ScalarType::SFixed32, ValueRef::I32(v)) => writer.write_fixed32(*v as u32),
            (ScalarType::Int64, ValueRef::I64(v)) => writer.write_varint(*v as u64),
            (ScalarType::SInt64, ValueRef::I64(v)) => writer.write_varint(encode_zigzag64(*v)),
            (ScalarType::SFixed64, ValueRef::I64(v)) => writer.write_fixed64(*v as u64),
            (ScalarType::UInt32, ValueRef::U32(v)) => writer.write_varint((*v).into()),
            (ScalarType::Fixed32, ValueRef::U32(v)) => writer.write_fixed32(*v),
            (ScalarType::UInt64, ValueRef::U64(v)) => writer.write_varint(*v),
            (ScalarType::Fixed64, ValueRef::U64(v)) => writer.write_fixed64(*v),
            (ScalarType::Float, ValueRef::F32(v)) => writer.write_fixed32(v.to_bits()),
            (ScalarType::Double, ValueRef::F64(v)) => writer.write_fixed64(v.to_bits()),
            (ScalarType::Bool, ValueRef::Bool(v)) => writer.write_varint(u64::from(*v)),
            (ScalarType::String, ValueRef::String(v)) => {
                writer.write_length_delimited(v.as_bytes())
            }
            (ScalarType::Bytes, ValueRef::Bytes(v)) => writer.write_length_delimited(v),
            _ => return Err(self.mismatch(plan)),
        }
        Ok(())
    }

    fn write_element(
        &self,
        registry: &ProtoRegistry,
        writer: &mut ProtoWriter,
        plan: &FieldPlan,
        element: Element,
        value: &ValueRef<'_>,
    ) -> Result<(), EncodeError> {
        match (element, value) {
            (Element::Scalar(scalar), value) => self.write_scalar(writer, plan, scalar, value),
            (Element::Enum { .. }, ValueRef::Enum(n)) => {
                writer.write_varint(*n as i64 as u64);
                Ok(())
            }
            (Element::Message { target }, ValueRef::Message(inner)) => {
                let marshaller = registry
                    .message_marshaller(target)
                    .ok_or_else(|| EncodeError::UnknownType(plan.unresolved()))?;
                writer.write_frame(|w| marshaller.write(registry, w, *inner))
            }
            _ => Err(self.mismatch(plan)),
        }
    }

    fn write_field(
        &self,
        registry: &ProtoRegistry,
        writer: &mut ProtoWriter,
        plan: &FieldPlan,
        value: ValueRef<'_>,
    ) -> Result<(), EncodeError> {
        let element_wire = plan.element.wire_type();
        match plan.cardinality {
            Cardinality::Required | Cardinality::Optional => {
                if value.is_absent() {
                    if plan.cardinality == Cardinality::Required {
                        return Err(RequiredFieldError {
                            type_name: self.descriptor.qualified_name().to_owned(),
                            field: plan.name.clone(),
                        }
                        .into());
                    }
                    return Ok(());
                }
                let implicit = !plan.presence && plan.cardinality == Cardinality::Optional;
                if implicit && is_default(&value, plan.default.as_ref()) {
                    return Ok(());
                }
                writer.write_tag(plan.number, element_wire);
                self.write_element(registry, writer, plan, plan.element, &value)
            }
            Cardinality::Repeated => {
                let ValueRef::List(items) = value else {
                    return Err(self.mismatch(plan));
                };
                if items.is_empty() {
                    return Ok(());
                }
                if plan.packed {
                    writer.write_tag(plan.number, WireType::LengthDelimited);
                    writer.write_frame(|w| {
                        items.iter().try_for_each(|item| {
                            self.write_element(registry, w, plan, plan.element, item)
                        })
                    })
                } else {
                    for item in &items {
                        writer.write_tag(plan.number, element_wire);
                        self.write_element(registry, writer, plan, plan.element, item)?;
                    }
                    Ok(())
                }
            }
            Cardinality::Map => {
                let ValueRef::Map(entries) = value else {
                    return Err(self.mismatch(plan));
                };
                let key_type = plan.map_key.ok_or_else(|| self.mismatch(plan))?;
                for (key, value) in &entries {
                    writer.write_tag(plan.number, WireType::LengthDelimited);
                    writer.write_frame(|w| {
                        w.write_tag(1, key_type.wire_type());
                        self.write_scalar(w, plan, key_type, key)?;
                        w.write_tag(2, element_wire);
                        self.write_element(registry, w, plan, plan.element, value)
                    })?;
                }
                Ok(())
            }
        }
    }

    pub(super) fn encode(
        &self,
        registry: &ProtoRegistry,
        writer: &mut ProtoWriter,
        value: &dyn Any,
    ) -> Result<(), EncodeError> {
        if value.type_id() != self.type_id {
            return Err(EncodeError::InstanceMismatch {
                expected: self.layout.type_path.to_string(),
            });
        }
        for plan in &self.fields {
            let field = self
                .layout
                .get(value, &plan.path)
                .ok_or_else(|| self.mismatch(plan))?;
            self.write_field(registry, writer, plan, field)?;
        }
        if let Some(accessor) = &self.layout.unknown
            && let Some(unknown) = accessor(value)
        {
            unknown.write_to(writer);
        }
        Ok(())
    }
}
