use core::any::{Any, TypeId};
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use super::MessageMarshaller;
use crate::builder::BuiltMessage;
use crate::collections::HashMap;
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::info::{
    Factory, FieldType, Getter, MemberKind, MessageInfo, TypeInfo, UnknownFieldsAccessor,
};
use crate::registry::ProtoRegistry;
use crate::schema::{Cardinality, DefaultValue, MessageType, ScalarType, ValueType};
use crate::value::ValueRef;
use crate::wire::{ProtoReader, ProtoWriter, WireType};

// -----------------------------------------------------------------------------
// Plans

/// The element of a field, after resolving names to native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Element {
    Scalar(ScalarType),
    Enum { target: TypeId, open: bool },
    Message { target: TypeId },
}

impl Element {
    pub(super) fn wire_type(self) -> WireType {
        match self {
            Self::Scalar(s) => s.wire_type(),
            Self::Enum { .. } => WireType::Varint,
            Self::Message { .. } => WireType::LengthDelimited,
        }
    }
}

/// Everything the decode and encode loops need to know about one field.
#[derive(Debug)]
pub(super) struct FieldPlan {
    pub number: u32,
    pub name: String,
    pub cardinality: Cardinality,
    pub element: Element,
    /// Qualified schema name of an enum or message element.
    pub target_name: Option<String>,
    pub map_key: Option<ScalarType>,
    pub default: Option<DefaultValue>,
    pub presence: bool,
    pub packed: bool,
    /// Index into the descriptor's oneof groups.
    pub oneof: Option<usize>,
    /// Member indices from the root type through flattened supertypes.
    pub path: Vec<usize>,
}

pub(super) enum MemberSlot {
    /// A field member and the index of its plan.
    Field { getter: Getter, plan: usize },
    Flatten { getter: Getter, layout: Layout },
}

impl FieldPlan {
    /// The name reported when the element's marshaller is not registered.
    pub(super) fn unresolved(&self) -> String {
        self.target_name.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// How to take an instance apart and put it back together.
pub(super) struct Layout {
    pub type_path: Cow<'static, str>,
    pub names: Arc<[Cow<'static, str>]>,
    pub factory: Factory,
    pub members: Vec<MemberSlot>,
    pub unknown: Option<UnknownFieldsAccessor>,
}

impl Layout {
    fn new(info: &TypeInfo, message: &MessageInfo) -> Result<Self, SchemaError> {
        let mut members = Vec::with_capacity(message.members().len());
        for member in message.members() {
            let getter = member.getter().clone();
            let slot = match member.kind() {
                MemberKind::Field => MemberSlot::Field {
                    getter,
                    plan: usize::MAX,
                },
                MemberKind::Flatten => {
                    let invalid = || SchemaError::InvalidFlatten {
                        type_path: info.type_path().to_owned(),
                        member: member.name().to_owned(),
                    };
                    let FieldType::Message(parent) = member.field_type() else {
                        return Err(invalid());
                    };
                    let parent_info = parent.info().ok_or_else(invalid)?;
                    let parent_message = parent_info.as_message().ok_or_else(invalid)?;
                    MemberSlot::Flatten {
                        getter,
                        layout: Layout::new(parent_info, parent_message)?,
                    }
                }
            };
            members.push(slot);
        }
        Ok(Self {
            type_path: info.type_path_cow(),
            names: message.members().iter().map(|m| m.name_cow()).collect(),
            factory: message.factory().clone(),
            members,
            unknown: message.unknown_fields().cloned(),
        })
    }

    fn bind(&mut self, path: &[usize], plan: usize) -> bool {
        match (path, path.first().and_then(|i| self.members.get_mut(*i))) {
            ([_], Some(MemberSlot::Field { plan: slot, .. })) => {
                *slot = plan;
                true
            }
            ([_, rest @ ..], Some(MemberSlot::Flatten { layout, .. })) => layout.bind(rest, plan),
            _ => false,
        }
    }

    /// Reads the value at `path` out of `value`.
    pub(super) fn get<'v>(&self, value: &'v dyn Any, path: &[usize]) -> Option<ValueRef<'v>> {
        let (first, rest) = path.split_first()?;
        match self.members.get(*first)? {
            MemberSlot::Field { getter, .. } => getter(value),
            MemberSlot::Flatten { getter, layout } => match getter(value)? {
                ValueRef::Message(inner) => layout.get(inner, rest),
                _ => None,
            },
        }
    }
}

// -----------------------------------------------------------------------------
// GeneratedMarshaller

/// A message marshaller compiled from a descriptor and type info.
pub struct GeneratedMarshaller {
    pub(super) type_id: TypeId,
    pub(super) descriptor: Arc<MessageType>,
    pub(super) fields: Vec<FieldPlan>,
    pub(super) by_number: HashMap<u32, usize>,
    /// Field indices per oneof group.
    pub(super) oneof_members: Vec<Vec<usize>>,
    pub(super) layout: Layout,
}

impl GeneratedMarshaller {
    /// Compiles the marshaller for `info`, whose fields were built into `built`.
    pub fn compile(info: &TypeInfo, built: &BuiltMessage) -> Result<Self, SchemaError> {
        let message = info.as_message().ok_or_else(|| SchemaError::MissingTypeInfo {
            type_path: info.type_path().to_owned(),
        })?;
        let mut layout = Layout::new(info, message)?;
        let descriptor = built.descriptor.clone();

        let mut fields = Vec::with_capacity(descriptor.fields().len());
        let mut by_number = HashMap::default();
        let pairs = descriptor.fields().iter().zip(&built.bindings);
        for (index, (field, binding)) in pairs.enumerate() {
            let missing_target = || SchemaError::MissingTypeInfo {
                type_path: format!("{}::{}", info.type_path(), field.name()),
            };
            let target_name = match field.value_type() {
                ValueType::Scalar(_) => None,
                ValueType::Enum(name) | ValueType::Message(name) => Some(name.clone()),
            };
            let element = match field.value_type() {
                ValueType::Scalar(s) => Element::Scalar(*s),
                ValueType::Enum(_) => Element::Enum {
                    target: binding.target.ok_or_else(missing_target)?,
                    open: binding.open_enum,
                },
                ValueType::Message(_) => Element::Message {
                    target: binding.target.ok_or_else(missing_target)?,
                },
            };
            let oneof = field
                .oneof()
                .and_then(|name| descriptor.oneofs().iter().position(|g| g.name() == name));
            if !layout.bind(&binding.path, index) {
                return Err(SchemaError::InvalidFlatten {
                    type_path: info.type_path().to_owned(),
                    member: field.name().to_owned(),
                });
            }
            by_number.insert(field.number(), index);
            fields.push(FieldPlan {
                number: field.number(),
                name: field.name().to_owned(),
                cardinality: field.cardinality(),
                element,
                target_name,
                map_key: field.map_key(),
                default: field.default_value().cloned(),
                presence: field.has_presence(),
                packed: field.is_packed(),
                oneof,
                path: binding.path.clone(),
            });
        }

        let oneof_members = descriptor
            .oneofs()
            .iter()
            .map(|group| {
                group
                    .numbers()
                    .iter()
                    .filter_map(|n| by_number.get(n).copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            type_id: info.id(),
            descriptor,
            fields,
            by_number,
            oneof_members,
            layout,
        })
    }
}

impl MessageMarshaller for GeneratedMarshaller {
    #[inline]
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    fn type_path(&self) -> &str {
        &self.layout.type_path
    }

    #[inline]
    fn descriptor(&self) -> &Arc<MessageType> {
        &self.descriptor
    }

    fn read(
        &self,
        registry: &ProtoRegistry,
        reader: &mut ProtoReader<'_>,
    ) -> Result<Box<dyn Any>, DecodeError> {
        self.decode(registry, reader)
    }

    fn write(
        &self,
        registry: &ProtoRegistry,
        writer: &mut ProtoWriter,
        value: &dyn Any,
    ) -> Result<(), EncodeError> {
        self.encode(registry, writer, value)
    }
}

impl fmt::Debug for GeneratedMarshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedMarshaller")
            .field("type_path", &self.layout.type_path)
            .field("message", &self.descriptor.qualified_name())
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
