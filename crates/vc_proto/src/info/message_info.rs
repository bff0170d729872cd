use core::any::Any;
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use super::{FieldType, TypeRef};
use crate::error::FactoryError;
use crate::schema::ScalarType;
use crate::value::{FieldValues, ValueRef};
use crate::wire::UnknownFieldSet;

// -----------------------------------------------------------------------------
// Accessors

/// Reads one member out of an instance.
///
/// Returns `None` when the instance is not of the described type.
pub type Getter = Arc<dyn Fn(&dyn Any) -> Option<ValueRef<'_>> + Send + Sync>;

/// Builds an instance from decoded member values.
pub type Factory = Arc<dyn Fn(FieldValues) -> Result<Box<dyn Any>, FactoryError> + Send + Sync>;

/// Lends the unknown fields an instance retained.
pub type UnknownFieldsAccessor = Arc<dyn Fn(&dyn Any) -> Option<&UnknownFieldSet> + Send + Sync>;

// -----------------------------------------------------------------------------
// MemberInfo

/// A default as written in the type's metadata, before it is checked
/// against the field's value type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultLiteral {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A string, bytes or enum value name.
    Str(Cow<'static, str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    /// The member is a supertype whose fields are inlined into this message.
    Flatten,
}

/// One declared member of a message type.
#[derive(Clone)]
pub struct MemberInfo {
    name: Cow<'static, str>,
    kind: MemberKind,
    number: Option<u32>,
    proto_name: Option<Cow<'static, str>>,
    field_type: FieldType,
    scalar: Option<ScalarType>,
    required: bool,
    default: Option<DefaultLiteral>,
    packed: Option<bool>,
    oneof: Option<Cow<'static, str>>,
    docs: Option<Cow<'static, str>>,
    getter: Getter,
}

impl MemberInfo {
    /// A field called `name` read by `getter`.
    pub fn field<F>(name: impl Into<Cow<'static, str>>, field_type: FieldType, getter: F) -> Self
    where
        F: Fn(&dyn Any) -> Option<ValueRef<'_>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            number: None,
            proto_name: None,
            field_type,
            scalar: None,
            required: false,
            default: None,
            packed: None,
            oneof: None,
            docs: None,
            getter: Arc::new(getter),
        }
    }

    /// A supertype member whose fields are flattened into the enclosing
    /// message. `getter` must yield [`ValueRef::Message`].
    pub fn flatten<F>(name: impl Into<Cow<'static, str>>, ty: TypeRef, getter: F) -> Self
    where
        F: Fn(&dyn Any) -> Option<ValueRef<'_>> + Send + Sync + 'static,
    {
        let mut member = Self::field(name, FieldType::Message(ty), getter);
        member.kind = MemberKind::Flatten;
        member
    }

    #[inline]
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    #[inline]
    pub fn with_proto_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.proto_name = Some(name.into());
        self
    }

    /// Encodes the value as `scalar` instead of the type's natural scalar.
    #[inline]
    pub fn with_scalar(mut self, scalar: ScalarType) -> Self {
        self.scalar = Some(scalar);
        self
    }

    #[inline]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[inline]
    pub fn with_default(mut self, default: DefaultLiteral) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = Some(packed);
        self
    }

    /// Puts the field into the oneof group `group`.
    #[inline]
    pub fn with_oneof(mut self, group: impl Into<Cow<'static, str>>) -> Self {
        self.oneof = Some(group.into());
        self
    }

    #[inline]
    pub fn with_docs(mut self, docs: impl Into<Cow<'static, str>>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// The native member name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    /// The schema field name: the override if present, else the member name.
    #[inline]
    pub fn proto_name(&self) -> &str {
        self.proto_name.as_deref().unwrap_or(&self.name)
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    #[inline]
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    #[inline]
    pub fn scalar(&self) -> Option<ScalarType> {
        self.scalar
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    pub fn default(&self) -> Option<&DefaultLiteral> {
        self.default.as_ref()
    }

    #[inline]
    pub fn packed(&self) -> Option<bool> {
        self.packed
    }

    #[inline]
    pub fn oneof(&self) -> Option<&str> {
        self.oneof.as_deref()
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    #[inline]
    pub fn getter(&self) -> &Getter {
        &self.getter
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("number", &self.number)
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// MessageInfo

/// Members and construction of a message type.
#[derive(Clone)]
pub struct MessageInfo {
    members: Vec<MemberInfo>,
    factory: Factory,
    factory_params: Option<Vec<Cow<'static, str>>>,
    unknown_fields: Option<UnknownFieldsAccessor>,
}

impl MessageInfo {
    /// A message built by `factory`.
    ///
    /// The factory receives one slot per member, in the order members are
    /// added.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(FieldValues) -> Result<Box<dyn Any>, FactoryError> + Send + Sync + 'static,
    {
        Self {
            members: Vec::new(),
            factory: Arc::new(factory),
            factory_params: None,
            unknown_fields: None,
        }
    }

    #[inline]
    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    /// Declares the member names the factory reads by name.
    ///
    /// Each must match a member; this is checked when the type is compiled.
    pub fn with_factory_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.factory_params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Lets the marshaller re-emit unknown fields the instance retained.
    pub fn with_unknown_fields<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&dyn Any) -> Option<&UnknownFieldSet> + Send + Sync + 'static,
    {
        self.unknown_fields = Some(Arc::new(accessor));
        self
    }

    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    #[inline]
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    #[inline]
    pub fn factory_params(&self) -> Option<&[Cow<'static, str>]> {
        self.factory_params.as_deref()
    }

    #[inline]
    pub fn unknown_fields(&self) -> Option<&UnknownFieldsAccessor> {
        self.unknown_fields.as_ref()
    }
}

impl fmt::Debug for MessageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageInfo")
            .field("members", &self.members)
            .field("factory_params", &self.factory_params)
            .field("unknown_fields", &self.unknown_fields.is_some())
            .finish_non_exhaustive()
    }
}
