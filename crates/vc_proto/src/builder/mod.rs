//! The metadata builder: one [`TypeRef`] in, one schema entry out.
//!
//! The builder checks everything that can be checked without looking at
//! the wire: field numbers, names, cardinalities, scalar overrides,
//! defaults, oneof grouping and supertype flattening. Referenced types are
//! named through a [`TypeResolver`], so the builder never decides whether a
//! reference is generated or imported.

// -----------------------------------------------------------------------------
// Modules

mod defaults;
mod naming;

// -----------------------------------------------------------------------------
// Exports

pub use naming::{enum_value_name, is_identifier, is_package, qualify};

use core::any::TypeId;
use std::sync::Arc;

use crate::collections::{HashMap, HashSet};
use crate::error::SchemaError;
use crate::info::{FieldType, MemberInfo, MemberKind, MessageInfo, TypeInfo, TypeKind, TypeRef};
use crate::schema::{
    Cardinality, EnumType, EnumValue, FieldDescriptor, MessageType, OneofGroup, ScalarType,
    ValueType,
};
use crate::wire::{MAX_FIELD_NUMBER, WireType};
use defaults::DefaultTarget;

// -----------------------------------------------------------------------------
// Resolution

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Message,
    Enum,
}

/// A referenced type as seen by the schema under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub qualified_name: String,
    pub kind: RefKind,
}

/// Names the types a schema entry refers to.
pub trait TypeResolver {
    fn resolve(&self, ty: &TypeRef) -> Option<ResolvedType>;
}

// -----------------------------------------------------------------------------
// Output

/// How the marshaller reaches a field's value and its referenced type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Member indices from the root type through flattened supertypes.
    pub path: Vec<usize>,
    /// The referenced message or enum, for non-scalar values.
    pub target: Option<TypeId>,
    /// Whether enum values outside the declared set are kept as numbers.
    pub open_enum: bool,
}

#[derive(Debug, Clone)]
pub struct BuiltMessage {
    pub descriptor: Arc<MessageType>,
    /// Parallel to the descriptor's fields.
    pub bindings: Vec<FieldBinding>,
}

#[derive(Debug, Clone)]
pub enum BuiltType {
    Message(BuiltMessage),
    Enum(Arc<EnumType>),
}

// -----------------------------------------------------------------------------
// MetadataBuilder

/// Builds schema entries for a compilation unit.
pub struct MetadataBuilder<'a> {
    resolver: &'a dyn TypeResolver,
}

struct FieldShape<'a> {
    cardinality: Cardinality,
    presence: bool,
    element: &'a FieldType,
    map_key: Option<ScalarType>,
}

const RESERVED_NUMBERS: core::ops::RangeInclusive<u32> = 19000..=19999;

impl<'a> MetadataBuilder<'a> {
    #[inline]
    pub fn new(resolver: &'a dyn TypeResolver) -> Self {
        Self { resolver }
    }

    /// Builds the entry for `ty`, which the resolver must already name.
    pub fn build(&self, ty: &TypeRef) -> Result<BuiltType, SchemaError> {
        let info = ty.info().ok_or_else(|| SchemaError::MissingTypeInfo {
            type_path: ty.type_path().to_owned(),
        })?;
        let resolved = self
            .resolver
            .resolve(ty)
            .ok_or_else(|| SchemaError::MissingTypeInfo {
                type_path: ty.type_path().to_owned(),
            })?;
        let name = info.proto_name();
        if !is_identifier(name) {
            return Err(SchemaError::InvalidName {
                type_path: info.type_path().to_owned(),
                name: name.to_owned(),
            });
        }

        match info.kind() {
            TypeKind::Message(message) => self
                .build_message(info, message, resolved.qualified_name)
                .map(BuiltType::Message),
            TypeKind::Enum(_) => build_enum(info, resolved.qualified_name)
                .map(|e| BuiltType::Enum(Arc::new(e))),
        }
    }

    fn build_message(
        &self,
        info: &TypeInfo,
        message: &MessageInfo,
        qualified_name: String,
    ) -> Result<BuiltMessage, SchemaError> {
        let type_path = info.type_path();

        if let Some(params) = message.factory_params() {
            for param in params {
                if !message.members().iter().any(|m| m.name() == param) {
                    return Err(SchemaError::UnresolvableAdapterMember {
                        type_path: type_path.to_owned(),
                        parameter: param.to_string(),
                    });
                }
            }
        }

        let mut fields = Vec::new();
        let mut bindings = Vec::new();
        let mut oneof_owner: HashMap<String, TypeId> = HashMap::default();
        let mut visiting = vec![info.id()];
        self.collect(
            info,
            type_path,
            message,
            &mut Vec::new(),
            &mut visiting,
            &mut oneof_owner,
            &mut fields,
            &mut bindings,
        )?;

        // Scoped: the lookup sets borrow `fields`.
        let oneofs = {
            let mut oneofs: Vec<OneofGroup> = Vec::new();
            let mut by_number: HashMap<u32, &str> = HashMap::default();
            let mut names: HashSet<&str> = HashSet::default();
            for field in &fields {
                if let Some(first) = by_number.insert(field.number, &field.name) {
                    return Err(SchemaError::DuplicateFieldNumber {
                        type_path: type_path.to_owned(),
                        number: field.number,
                        first: first.to_owned(),
                        second: field.name.clone(),
                    });
                }
                if !names.insert(&field.name) {
                    return Err(SchemaError::DuplicateFieldName {
                        type_path: type_path.to_owned(),
                        name: field.name.clone(),
                    });
                }
            }

            for field in &fields {
                let Some(group) = &field.oneof else { continue };
                if names.contains(group.as_str()) {
                    return Err(SchemaError::ConflictingOneof {
                        type_path: type_path.to_owned(),
                        member: field.name.clone(),
                        oneof: group.clone(),
                        other: format!("field `{group}`"),
                    });
                }
                match oneofs.iter_mut().find(|g| &g.name == group) {
                    Some(g) => g.numbers.push(field.number),
                    None => oneofs.push(OneofGroup {
                        name: group.clone(),
                        numbers: vec![field.number],
                    }),
                }
            }
            oneofs
        };

        let descriptor = MessageType {
            name: info.proto_name().to_owned(),
            qualified_name,
            fields,
            oneofs,
            docs: info.docs().map(str::to_owned),
        };
        log::debug!(
            "built message `{}` for `{type_path}` with {} fields",
            descriptor.qualified_name,
            descriptor.fields.len()
        );
        Ok(BuiltMessage {
            descriptor: Arc::new(descriptor),
            bindings,
        })
    }

    // Appends the fields of `message`, inlining flattened supertypes.
    fn collect(
        &self,
        info: &TypeInfo,
        root_path: &str,
        message: &MessageInfo,
        prefix: &mut Vec<usize>,
        visiting: &mut Vec<TypeId>,
        oneof_owner: &mut HashMap<String, TypeId>,
        fields: &mut Vec<FieldDescriptor>,
        bindings: &mut Vec<FieldBinding>,
    ) -> Result<(), SchemaError> {
        for (index, member) in message.members().iter().enumerate() {
            prefix.push(index);
            match member.kind() {
                MemberKind::Flatten => {
                    let invalid = || SchemaError::InvalidFlatten {
                        type_path: root_path.to_owned(),
                        member: member.name().to_owned(),
                    };
                    let FieldType::Message(parent) = member.field_type() else {
                        return Err(invalid());
                    };
                    let parent_info = parent.info().ok_or_else(invalid)?;
                    let parent_message = parent_info.as_message().ok_or_else(invalid)?;
                    if visiting.contains(&parent.id()) {
                        return Err(SchemaError::FlattenCycle {
                            type_path: root_path.to_owned(),
                            member: member.name().to_owned(),
                        });
                    }
                    visiting.push(parent.id());
                    self.collect(
                        parent_info,
                        root_path,
                        parent_message,
                        prefix,
                        visiting,
                        oneof_owner,
                        fields,
                        bindings,
                    )?;
                    visiting.pop();
                }
                MemberKind::Field => {
                    let (field, binding) = self.field(root_path, member, prefix.clone())?;
                    if let Some(group) = &field.oneof {
                        let owner = *oneof_owner.entry(group.clone()).or_insert(info.id());
                        if owner != info.id() {
                            return Err(SchemaError::ConflictingOneof {
                                type_path: root_path.to_owned(),
                                member: field.name.clone(),
                                oneof: group.clone(),
                                other: format!("oneof `{group}` of a flattened supertype"),
                            });
                        }
                    }
                    fields.push(field);
                    bindings.push(binding);
                }
            }
            prefix.pop();
        }
        Ok(())
    }

    fn shape<'m>(type_path: &str, member: &'m MemberInfo) -> Result<FieldShape<'m>, SchemaError> {
        let invalid = |reason| SchemaError::InvalidCardinality {
            type_path: type_path.to_owned(),
            member: member.name().to_owned(),
            reason,
        };
        let required = member.is_required();

        let shape = match member.field_type() {
            FieldType::Optional(inner) => {
                if !is_singular(inner) {
                    return Err(invalid("an optional must wrap a singular value"));
                }
                FieldShape {
                    cardinality: if required {
                        Cardinality::Required
                    } else {
                        Cardinality::Optional
                    },
                    presence: true,
                    element: inner,
                    map_key: None,
                }
            }
            FieldType::Repeated(inner) => {
                if !is_singular(inner) {
                    return Err(invalid("repeated values must be singular"));
                }
                if required {
                    return Err(invalid("a repeated field cannot be required"));
                }
                FieldShape {
                    cardinality: Cardinality::Repeated,
                    presence: false,
                    element: inner,
                    map_key: None,
                }
            }
            FieldType::Map(key, value) => {
                let key = match **key {
                    FieldType::Scalar(s) if s.is_valid_map_key() => s,
                    _ => {
                        return Err(SchemaError::InvalidMapKey {
                            type_path: type_path.to_owned(),
                            member: member.name().to_owned(),
                        });
                    }
                };
                if !is_singular(value) {
                    return Err(invalid("map values must be singular"));
                }
                if required {
                    return Err(invalid("a map field cannot be required"));
                }
                FieldShape {
                    cardinality: Cardinality::Map,
                    presence: false,
                    element: value,
                    map_key: Some(key),
                }
            }
            // A bare message cannot represent absence.
            ty @ FieldType::Message(_) => FieldShape {
                cardinality: Cardinality::Required,
                presence: true,
                element: ty,
                map_key: None,
            },
            ty => FieldShape {
                cardinality: if required { Cardinality::Required } else { Cardinality::Optional },
                presence: false,
                element: ty,
                map_key: None,
            },
        };
        Ok(shape)
    }

    fn resolve_ref(
        &self,
        type_path: &str,
        member: &MemberInfo,
        ty: &TypeRef,
        expected: RefKind,
    ) -> Result<String, SchemaError> {
        let resolved = self
            .resolver
            .resolve(ty)
            .ok_or_else(|| SchemaError::MissingTypeInfo {
                type_path: ty.type_path().to_owned(),
            })?;
        if resolved.kind != expected {
            return Err(SchemaError::KindMismatch {
                type_path: type_path.to_owned(),
                member: member.name().to_owned(),
                referenced: ty.type_path().to_owned(),
                expected: match expected {
                    RefKind::Message => "a message",
                    RefKind::Enum => "an enum",
                },
            });
        }
        Ok(resolved.qualified_name)
    }

    fn field(
        &self,
        type_path: &str,
        member: &MemberInfo,
        path: Vec<usize>,
    ) -> Result<(FieldDescriptor, FieldBinding), SchemaError> {
        let number = member.number().ok_or_else(|| SchemaError::MissingFieldNumber {
            type_path: type_path.to_owned(),
            member: member.name().to_owned(),
        })?;
        if number == 0 || number > MAX_FIELD_NUMBER || RESERVED_NUMBERS.contains(&number) {
            return Err(SchemaError::InvalidFieldNumber {
                type_path: type_path.to_owned(),
                member: member.name().to_owned(),
                number,
            });
        }
        let name = member.proto_name();
        if !is_identifier(name) {
            return Err(SchemaError::InvalidName {
                type_path: type_path.to_owned(),
                name: name.to_owned(),
            });
        }

        let shape = Self::shape(type_path, member)?;

        let mut binding = FieldBinding {
            path,
            target: None,
            open_enum: false,
        };
        let value_type = match shape.element {
            FieldType::Scalar(natural) => {
                let scalar = match member.scalar() {
                    Some(over) if over.kind() == natural.kind() => over,
                    Some(over) => {
                        return Err(SchemaError::IncompatibleScalar {
                            type_path: type_path.to_owned(),
                            member: member.name().to_owned(),
                            scalar: over.proto_name(),
                        });
                    }
                    None => *natural,
                };
                ValueType::Scalar(scalar)
            }
            FieldType::Enum { ty, open } => {
                binding.target = Some(ty.id());
                binding.open_enum = *open;
                ValueType::Enum(self.resolve_ref(type_path, member, ty, RefKind::Enum)?)
            }
            FieldType::Message(ty) => {
                binding.target = Some(ty.id());
                ValueType::Message(self.resolve_ref(type_path, member, ty, RefKind::Message)?)
            }
            FieldType::Optional(_) | FieldType::Repeated(_) | FieldType::Map(..) => {
                unreachable!("shape() only yields singular elements")
            }
        };
        if member.scalar().is_some() && !matches!(value_type, ValueType::Scalar(_)) {
            return Err(SchemaError::IncompatibleScalar {
                type_path: type_path.to_owned(),
                member: member.name().to_owned(),
                scalar: member.scalar().map_or("", ScalarType::proto_name),
            });
        }

        let packable = match &value_type {
            ValueType::Scalar(s) => s.is_packable(),
            ValueType::Enum(_) => true,
            ValueType::Message(_) => false,
        };
        let repeated = shape.cardinality == Cardinality::Repeated;
        let packed = match member.packed() {
            Some(true) if !(repeated && packable) => {
                return Err(SchemaError::InvalidCardinality {
                    type_path: type_path.to_owned(),
                    member: member.name().to_owned(),
                    reason: "only repeated numeric fields can be packed",
                });
            }
            Some(packed) => packed,
            None => repeated && packable,
        };

        let default = match member.default() {
            None => None,
            Some(literal) => {
                let target = match (shape.cardinality, shape.element) {
                    (Cardinality::Repeated | Cardinality::Map, _) => None,
                    (_, FieldType::Enum { ty, .. }) => Some(DefaultTarget::Enum(ty)),
                    (_, FieldType::Scalar(_)) => match &value_type {
                        ValueType::Scalar(s) => Some(DefaultTarget::Scalar(s.kind())),
                        _ => None,
                    },
                    _ => None,
                };
                let invalid = |reason| SchemaError::InvalidDefault {
                    type_path: type_path.to_owned(),
                    member: member.name().to_owned(),
                    reason,
                };
                let target = target.ok_or_else(|| {
                    invalid("only singular scalar and enum fields take defaults".to_owned())
                })?;
                Some(defaults::convert(literal, target).map_err(invalid)?)
            }
        };

        let oneof = match member.oneof() {
            None => None,
            Some(group) => {
                if !shape.presence || shape.cardinality != Cardinality::Optional {
                    return Err(SchemaError::InvalidOneofMember {
                        type_path: type_path.to_owned(),
                        oneof: group.to_owned(),
                        member: member.name().to_owned(),
                    });
                }
                if !is_identifier(group) {
                    return Err(SchemaError::InvalidName {
                        type_path: type_path.to_owned(),
                        name: group.to_owned(),
                    });
                }
                Some(group.to_owned())
            }
        };

        let wire_type = if shape.cardinality == Cardinality::Map {
            WireType::LengthDelimited
        } else {
            value_type.wire_type()
        };

        let field = FieldDescriptor {
            number,
            name: name.to_owned(),
            wire_type,
            cardinality: shape.cardinality,
            value_type,
            map_key: shape.map_key,
            default,
            presence: shape.presence,
            packed,
            oneof,
            docs: member.docs().map(str::to_owned),
        };
        Ok((field, binding))
    }
}

fn is_singular(ty: &FieldType) -> bool {
    matches!(
        ty,
        FieldType::Scalar(_) | FieldType::Enum { .. } | FieldType::Message(_)
    )
}

fn build_enum(info: &TypeInfo, qualified_name: String) -> Result<EnumType, SchemaError> {
    let type_path = info.type_path();
    let Some(enumeration) = info.as_enum() else {
        return Err(SchemaError::MissingTypeInfo {
            type_path: type_path.to_owned(),
        });
    };
    if enumeration.variants().is_empty() {
        return Err(SchemaError::EmptyEnum {
            type_path: type_path.to_owned(),
        });
    }

    let mut values: Vec<EnumValue> = Vec::with_capacity(enumeration.variants().len());
    for variant in enumeration.variants() {
        let name = enum_value_name(variant);
        if !is_identifier(&name) {
            return Err(SchemaError::InvalidName {
                type_path: type_path.to_owned(),
                name,
            });
        }
        if values.iter().any(|v| v.name == name) {
            return Err(SchemaError::DuplicateEnumValue {
                type_path: type_path.to_owned(),
                what: "name",
                value: name,
            });
        }
        if values.iter().any(|v| v.number == variant.number()) {
            return Err(SchemaError::DuplicateEnumValue {
                type_path: type_path.to_owned(),
                what: "number",
                value: variant.number().to_string(),
            });
        }
        values.push(EnumValue {
            name,
            number: variant.number(),
            docs: variant.docs().map(str::to_owned),
        });
    }

    Ok(EnumType {
        name: info.proto_name().to_owned(),
        qualified_name,
        values,
        docs: info.docs().map(str::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use core::any::Any;

    use super::*;
    use crate::info::{DefaultLiteral, EnumInfo, VariantInfo};
    use crate::schema::DefaultValue;

    struct Sample;
    struct Leaf;
    enum Level {}

    struct Names(Vec<(TypeId, ResolvedType)>);

    impl TypeResolver for Names {
        fn resolve(&self, ty: &TypeRef) -> Option<ResolvedType> {
            self.0
                .iter()
                .find(|(id, _)| *id == ty.id())
                .map(|(_, resolved)| resolved.clone())
        }
    }

    fn names() -> Names {
        let entry = |id, name: &str, kind| {
            (
                id,
                ResolvedType {
                    qualified_name: name.to_owned(),
                    kind,
                },
            )
        };
        Names(vec![
            entry(TypeId::of::<Sample>(), "test.Sample", RefKind::Message),
            entry(TypeId::of::<Leaf>(), "test.Leaf", RefKind::Message),
            entry(TypeId::of::<Level>(), "test.Level", RefKind::Enum),
        ])
    }

    fn sample(members: Vec<MemberInfo>) -> TypeRef {
        let info = members.into_iter().fold(
            MessageInfo::new(|_| Ok(Box::new(Sample) as Box<dyn Any>)),
            MessageInfo::with_member,
        );
        TypeRef::dynamic(TypeInfo::message::<Sample>(info))
    }

    fn leaf() -> TypeRef {
        let info = MessageInfo::new(|_| Ok(Box::new(Leaf) as Box<dyn Any>));
        TypeRef::dynamic(TypeInfo::message::<Leaf>(info))
    }

    fn level(variants: &[(&'static str, i32)]) -> TypeRef {
        let info = variants
            .iter()
            .fold(EnumInfo::new(), |info, &(name, number)| {
                info.with_variant(VariantInfo::new(name, number))
            });
        TypeRef::dynamic(TypeInfo::enumeration::<Level>(info))
    }

    fn field(name: &'static str, ty: FieldType) -> MemberInfo {
        MemberInfo::field(name, ty, |_| None)
    }

    fn int(name: &'static str, number: u32) -> MemberInfo {
        field(name, FieldType::Scalar(ScalarType::Int32)).with_number(number)
    }

    fn build(ty: &TypeRef) -> Result<BuiltMessage, SchemaError> {
        match MetadataBuilder::new(&names()).build(ty)? {
            BuiltType::Message(built) => Ok(built),
            BuiltType::Enum(_) => panic!("expected a message"),
        }
    }

    #[test]
    fn infers_cardinality_and_presence() {
        let optional = |ty| FieldType::Optional(Box::new(ty));
        let repeated = |ty| FieldType::Repeated(Box::new(ty));
        let ty = sample(vec![
            int("plain", 1),
            field("maybe", optional(FieldType::Scalar(ScalarType::Int32))).with_number(2),
            field("leaf", FieldType::Message(leaf())).with_number(3),
            field("numbers", repeated(FieldType::Scalar(ScalarType::Int64))).with_number(4),
            field("names", repeated(FieldType::Scalar(ScalarType::String))).with_number(5),
            int("id", 6).with_required(true),
        ]);
        let built = build(&ty).unwrap();
        let fields = built.descriptor.fields();
        let shape = |i: usize| {
            let field = &fields[i];
            (field.cardinality(), field.has_presence(), field.is_packed())
        };

        assert_eq!(shape(0), (Cardinality::Optional, false, false));
        assert_eq!(shape(1), (Cardinality::Optional, true, false));
        assert_eq!(shape(2), (Cardinality::Required, true, false));
        assert_eq!(shape(3), (Cardinality::Repeated, false, true));
        assert_eq!(shape(4), (Cardinality::Repeated, false, false));
        assert_eq!(shape(5), (Cardinality::Required, false, false));

        assert_eq!(fields[2].value_type(), &ValueType::Message("test.Leaf".into()));
        assert_eq!(built.bindings[2].target, Some(TypeId::of::<Leaf>()));
        assert_eq!(built.bindings[0].path, [0]);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = build(&sample(vec![int("a", 1), int("b", 1)])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateFieldNumber {
                type_path: core::any::type_name::<Sample>().into(),
                number: 1,
                first: "a".into(),
                second: "b".into(),
            }
        );

        let missing = field("a", FieldType::Scalar(ScalarType::Int32));
        assert!(matches!(
            build(&sample(vec![missing])),
            Err(SchemaError::MissingFieldNumber { member, .. }) if member == "a"
        ));

        for number in [0, 19_000, 19_999, MAX_FIELD_NUMBER + 1] {
            assert!(matches!(
                build(&sample(vec![int("a", number)])),
                Err(SchemaError::InvalidFieldNumber { number: n, .. }) if n == number
            ));
        }
        assert!(build(&sample(vec![int("a", MAX_FIELD_NUMBER)])).is_ok());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = build(&sample(vec![
            int("a", 1),
            int("b", 2).with_proto_name("a"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldName { name, .. } if name == "a"));
    }

    #[test]
    fn checks_oneof_members() {
        let optional = || FieldType::Optional(Box::new(FieldType::Scalar(ScalarType::String)));
        let built = build(&sample(vec![
            field("email", optional()).with_number(1).with_oneof("contact"),
            field("phone", optional()).with_number(2).with_oneof("contact"),
        ]))
        .unwrap();
        let groups = built.descriptor.oneofs();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name(), "contact");
        assert_eq!(groups[0].numbers(), [1, 2]);

        let err = build(&sample(vec![int("a", 1).with_oneof("choice")])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOneofMember { member, .. } if member == "a"));

        let err = build(&sample(vec![
            int("contact", 1),
            field("email", optional()).with_number(2).with_oneof("contact"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::ConflictingOneof { .. }));
    }

    #[test]
    fn checks_scalar_overrides() {
        let built = build(&sample(vec![int("a", 1).with_scalar(ScalarType::SInt32)])).unwrap();
        assert_eq!(
            built.descriptor.fields()[0].value_type(),
            &ValueType::Scalar(ScalarType::SInt32)
        );
        assert_eq!(built.descriptor.fields()[0].wire_type(), WireType::Varint);

        let err = build(&sample(vec![int("a", 1).with_scalar(ScalarType::Fixed64)])).unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleScalar { scalar: "fixed64", .. }));
    }

    #[test]
    fn checks_packing() {
        let strings = FieldType::Repeated(Box::new(FieldType::Scalar(ScalarType::String)));
        let packed = field("a", strings).with_number(1).with_packed(true);
        let err = build(&sample(vec![packed])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCardinality { .. }));

        let ints = FieldType::Repeated(Box::new(FieldType::Scalar(ScalarType::Int32)));
        let unpacked = field("a", ints).with_number(1).with_packed(false);
        let built = build(&sample(vec![unpacked])).unwrap();
        assert!(!built.descriptor.fields()[0].is_packed());
    }

    #[test]
    fn checks_defaults() {
        let with_default = |literal| sample(vec![int("a", 1).with_default(literal)]);

        let built = build(&with_default(DefaultLiteral::Int(-5))).unwrap();
        assert_eq!(
            built.descriptor.fields()[0].default_value(),
            Some(&DefaultValue::Int(-5))
        );

        let err = build(&with_default(DefaultLiteral::Int(1 << 40))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));

        let err = build(&with_default(DefaultLiteral::Bool(true))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));

        let enum_field = field(
            "level",
            FieldType::Enum {
                ty: level(&[("Low", 0), ("VeryHigh", 2)]),
                open: false,
            },
        )
        .with_number(1)
        .with_default(DefaultLiteral::Str("VERY_HIGH".into()));
        let built = build(&sample(vec![enum_field])).unwrap();
        assert_eq!(
            built.descriptor.fields()[0].default_value(),
            Some(&DefaultValue::Enum {
                name: "VERY_HIGH".into(),
                number: 2,
            })
        );
    }

    #[test]
    fn checks_factory_params() {
        let info = MessageInfo::new(|_| Ok(Box::new(Sample) as Box<dyn Any>))
            .with_member(int("a", 1))
            .with_factory_params(["a", "b"]);
        let err = build(&TypeRef::dynamic(TypeInfo::message::<Sample>(info))).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnresolvableAdapterMember { parameter, .. } if parameter == "b"
        ));
    }

    #[test]
    fn checks_reference_kinds() {
        let wrong = field("leaf", FieldType::Message(level(&[("Low", 0)]))).with_number(1);
        let err = build(&sample(vec![wrong])).unwrap_err();
        assert!(matches!(err, SchemaError::KindMismatch { expected: "a message", .. }));

        let foreign = FieldType::Message(TypeRef::foreign::<String>());
        let unknown = field("other", foreign).with_number(1);
        let err = build(&sample(vec![unknown])).unwrap_err();
        assert!(matches!(err, SchemaError::MissingTypeInfo { .. }));
    }

    #[test]
    fn flattens_supertypes() {
        let base_info = MessageInfo::new(|_| Ok(Box::new(Leaf) as Box<dyn Any>))
            .with_member(int("id", 1))
            .with_member(int("version", 2));
        let base = TypeRef::dynamic(TypeInfo::message::<Leaf>(base_info));
        let built = build(&sample(vec![
            MemberInfo::flatten("base", base, |_| None),
            int("name", 3),
        ]))
        .unwrap();

        let names: Vec<_> = built.descriptor.fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["id", "version", "name"]);
        assert_eq!(built.bindings[1].path, [0, 1]);
        assert_eq!(built.bindings[2].path, [1]);

        let not_message = MemberInfo::flatten("base", level(&[("Low", 0)]), |_| None);
        assert!(matches!(
            build(&sample(vec![not_message])),
            Err(SchemaError::InvalidFlatten { .. })
        ));
    }

    #[test]
    fn builds_enums() {
        let ty = level(&[("Low", 0), ("VeryHigh", 2)]);
        let BuiltType::Enum(built) = MetadataBuilder::new(&names()).build(&ty).unwrap() else {
            panic!("expected an enum");
        };
        assert_eq!(built.qualified_name(), "test.Level");
        assert_eq!(built.value(2).map(EnumValue::name), Some("VERY_HIGH"));

        let err = MetadataBuilder::new(&names())
            .build(&level(&[("Low", 0), ("High", 0)]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEnumValue { what: "number", .. }));

        let err = MetadataBuilder::new(&names())
            .build(&level(&[("Low", 0), ("LOW", 1)]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEnumValue { what: "name", .. }));

        let err = MetadataBuilder::new(&names()).build(&level(&[])).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyEnum { .. }));
    }
}
