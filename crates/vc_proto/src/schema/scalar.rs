use core::fmt;

use crate::wire::WireType;

/// The protobuf scalar value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
}

/// The native representation a scalar decodes into.
///
/// Two scalars with the same kind are interchangeable for a field; an
/// override may only switch between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub const ALL: [ScalarType; 15] = [
        Self::Double,
        Self::Float,
        Self::Int32,
        Self::Int64,
        Self::UInt32,
        Self::UInt64,
        Self::SInt32,
        Self::SInt64,
        Self::Fixed32,
        Self::Fixed64,
        Self::SFixed32,
        Self::SFixed64,
        Self::Bool,
        Self::String,
        Self::Bytes,
    ];

    /// The keyword used in `.proto` files.
    pub const fn proto_name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    pub fn from_proto_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.proto_name() == name)
    }

    pub const fn wire_type(self) -> WireType {
        match self {
            Self::Double | Self::Fixed64 | Self::SFixed64 => WireType::Fixed64,
            Self::Float | Self::Fixed32 | Self::SFixed32 => WireType::Fixed32,
            Self::String | Self::Bytes => WireType::LengthDelimited,
            Self::Int32
            | Self::Int64
            | Self::UInt32
            | Self::UInt64
            | Self::SInt32
            | Self::SInt64
            | Self::Bool => WireType::Varint,
        }
    }

    pub const fn kind(self) -> ScalarKind {
        match self {
            Self::Int32 | Self::SInt32 | Self::SFixed32 => ScalarKind::I32,
            Self::Int64 | Self::SInt64 | Self::SFixed64 => ScalarKind::I64,
            Self::UInt32 | Self::Fixed32 => ScalarKind::U32,
            Self::UInt64 | Self::Fixed64 => ScalarKind::U64,
            Self::Float => ScalarKind::F32,
            Self::Double => ScalarKind::F64,
            Self::Bool => ScalarKind::Bool,
            Self::String => ScalarKind::String,
            Self::Bytes => ScalarKind::Bytes,
        }
    }

    /// Whether repeated values of this type may use the packed encoding.
    #[inline]
    pub const fn is_packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }

    /// Whether this type may be a map key.
    #[inline]
    pub const fn is_valid_map_key(self) -> bool {
        !matches!(self, Self::Double | Self::Float | Self::Bytes)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proto_name())
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        })
    }
}
