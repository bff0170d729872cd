use core::fmt;
use std::sync::Arc;

use super::ScalarType;
use crate::wire::WireType;

// -----------------------------------------------------------------------------
// Field

/// How many values a field holds and how absence is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Must be present on the wire and set before encoding.
    Required,
    Optional,
    Repeated,
    Map,
}

impl Cardinality {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Repeated => "repeated",
            Self::Map => "map",
        }
    }
}

/// The value a field refers to.
///
/// Messages and enums are referenced by qualified schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Scalar(ScalarType),
    Message(String),
    Enum(String),
}

impl ValueType {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Scalar(scalar) => scalar.wire_type(),
            Self::Message(_) => WireType::LengthDelimited,
            Self::Enum(_) => WireType::Varint,
        }
    }
}

/// A declared default, already checked against the field's value type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Enum { name: String, number: i32 },
}

/// One field of a [`MessageType`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub(crate) number: u32,
    pub(crate) name: String,
    pub(crate) wire_type: WireType,
    pub(crate) cardinality: Cardinality,
    pub(crate) value_type: ValueType,
    pub(crate) map_key: Option<ScalarType>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) presence: bool,
    pub(crate) packed: bool,
    pub(crate) oneof: Option<String>,
    pub(crate) docs: Option<String>,
}

impl FieldDescriptor {
    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wire type of one element; map entries are length-delimited.
    ///
    /// Packed repeated fields travel as one length-delimited value holding
    /// elements of this type.
    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    #[inline]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// For maps, the value type of the entries.
    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn map_key(&self) -> Option<ScalarType> {
        self.map_key
    }

    #[inline]
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Whether "unset" is distinguishable from the default value.
    #[inline]
    pub fn has_presence(&self) -> bool {
        self.presence
    }

    #[inline]
    pub fn is_packed(&self) -> bool {
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
}

// -----------------------------------------------------------------------------
// Message

/// Fields that are mutually exclusive on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofGroup {
    pub(crate) name: String,
    pub(crate) numbers: Vec<u32>,
}

impl OneofGroup {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member field numbers in declaration order.
    #[inline]
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageType {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) oneofs: Vec<OneofGroup>,
    pub(crate) docs: Option<String>,
}

impl MessageType {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[inline]
    pub fn oneofs(&self) -> &[OneofGroup] {
        &self.oneofs
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }
}

// -----------------------------------------------------------------------------
// Enum

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub(crate) name: String,
    pub(crate) number: i32,
    pub(crate) docs: Option<String>,
}

impl EnumValue {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn number(&self) -> i32 {
        self.number
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }
}

/// Values are unique by name and by number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) values: Vec<EnumValue>,
    pub(crate) docs: Option<String>,
}

impl EnumType {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    #[inline]
    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }

    pub fn value(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }

    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }
}

// -----------------------------------------------------------------------------
// Descriptor

/// A shared message or enum descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Message(Arc<MessageType>),
    Enum(Arc<EnumType>),
}

impl Descriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Message(m) => m.name(),
            Self::Enum(e) => e.name(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        match self {
            Self::Message(m) => m.qualified_name(),
            Self::Enum(e) => e.qualified_name(),
        }
    }

    pub fn as_message(&self) -> Option<&Arc<MessageType>> {
        match self {
            Self::Message(m) => Some(m),
            Self::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumType>> {
        match self {
            Self::Enum(e) => Some(e),
            Self::Message(_) => None,
        }
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(_) => write!(f, "message {}", self.qualified_name()),
            Self::Enum(_) => write!(f, "enum {}", self.qualified_name()),
        }
    }
}
