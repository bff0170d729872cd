//! Error types.
//!
//! Each stage has its own error enum. The aggregates [`CompileError`],
//! [`DecodeError`] and [`EncodeError`] wrap them so callers can use `?`
//! throughout.

use thiserror::Error;

use crate::wire::WireType;

// -----------------------------------------------------------------------------
// Schema definition

/// A type's declared metadata cannot be turned into a schema entry.
///
/// Always names the offending type and, where relevant, the member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("a compilation unit must request at least one type")]
    EmptyCompilation,
    #[error("`{type_path}::{member}` has no field number")]
    MissingFieldNumber { type_path: String, member: String },
    #[error("`{type_path}::{member}` uses invalid field number {number}")]
    InvalidFieldNumber {
        type_path: String,
        member: String,
        number: u32,
    },
    #[error("`{type_path}`: field number {number} is used by both `{first}` and `{second}`")]
    DuplicateFieldNumber {
        type_path: String,
        number: u32,
        first: String,
        second: String,
    },
    #[error("`{type_path}`: field name `{name}` is declared twice")]
    DuplicateFieldName { type_path: String, name: String },
    #[error("schema name `{name}` is claimed by both `{first}` and `{second}`")]
    DuplicateTypeName {
        name: String,
        first: String,
        second: String,
    },
    #[error("`{type_path}`: field `{member}` cannot belong to oneof `{oneof}`, it is already in `{other}`")]
    ConflictingOneof {
        type_path: String,
        member: String,
        oneof: String,
        other: String,
    },
    #[error("`{type_path}`: oneof `{oneof}` member `{member}` must be an optional singular field")]
    InvalidOneofMember {
        type_path: String,
        oneof: String,
        member: String,
    },
    #[error("`{type_path}`: factory parameter `{parameter}` has no matching member")]
    UnresolvableAdapterMember { type_path: String, parameter: String },
    #[error("`{name}` (from `{type_path}`) is not a valid schema identifier")]
    InvalidName { type_path: String, name: String },
    #[error("`{type_path}::{member}`: `{scalar}` cannot carry this field's value")]
    IncompatibleScalar {
        type_path: String,
        member: String,
        scalar: &'static str,
    },
    #[error("`{type_path}::{member}`: invalid default value, {reason}")]
    InvalidDefault {
        type_path: String,
        member: String,
        reason: String,
    },
    #[error("`{type_path}::{member}`: {reason}")]
    InvalidCardinality {
        type_path: String,
        member: String,
        reason: &'static str,
    },
    #[error("`{type_path}::{member}`: map keys must be integral, bool or string")]
    InvalidMapKey { type_path: String, member: String },
    #[error("`{type_path}`: enum value {what} `{value}` is declared twice")]
    DuplicateEnumValue {
        type_path: String,
        what: &'static str,
        value: String,
    },
    #[error("`{type_path}`: an enum needs at least one value")]
    EmptyEnum { type_path: String },
    #[error("`{type_path}` flattens itself through `{member}`")]
    FlattenCycle { type_path: String, member: String },
    #[error("`{type_path}::{member}`: only message types can be flattened")]
    InvalidFlatten { type_path: String, member: String },
    #[error("`{type_path}::{member}` refers to `{referenced}` as {expected}, but it is not one")]
    KindMismatch {
        type_path: String,
        member: String,
        referenced: String,
        expected: &'static str,
    },
    #[error("`{type_path}` has no type information and no adapter")]
    MissingTypeInfo { type_path: String },
}

// -----------------------------------------------------------------------------
// Import resolution

/// A referenced type could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("`{referenced}` (referenced by `{referrer}`) is not requested, not registered and closure expansion is disabled")]
    Unresolved { referrer: String, referenced: String },
    #[error("`{type_path}` is a foreign type without adapter or registered marshaller")]
    NoAdapter { type_path: String },
}

// -----------------------------------------------------------------------------
// Wire format

/// Malformed protobuf input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum WireError {
    #[error("unexpected end of input, needed {needed} more bytes")]
    Truncated { needed: usize },
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid tag {0:#x}")]
    InvalidTag(u64),
    #[error("unknown wire type {0}")]
    UnknownWireType(u8),
    #[error("field {number} expects wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        number: u32,
        expected: WireType,
        found: WireType,
    },
    #[error("length {0} exceeds the remaining input")]
    LengthOverflow(u64),
    #[error("field {number} is not valid UTF-8")]
    InvalidUtf8 { number: u32 },
    #[error("messages nest deeper than {0} levels")]
    RecursionLimit(u32),
}

// -----------------------------------------------------------------------------
// Required field

/// A required field was absent while decoding, or unset while encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required field `{field}` of `{type_name}` is not set")]
pub struct RequiredFieldError {
    pub type_name: String,
    pub field: String,
}

// -----------------------------------------------------------------------------
// Registration

/// An identity is already bound to something different.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("`{type_path}` is already registered with a different descriptor for `{name}`")]
    TypeConflict { type_path: String, name: String },
    #[error("schema name `{name}` is already bound to `{existing}`")]
    NameConflict { name: String, existing: String },
    #[error("file `{file}` is already registered with different content")]
    FileConflict { file: String },
}

// -----------------------------------------------------------------------------
// Values and factories

/// A wire value does not fit the native field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{value} is not a value of `{type_path}`")]
    UnknownEnumValue { type_path: &'static str, value: i32 },
}

/// A factory could not build an instance from decoded values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FactoryError {
    #[error("`{type_path}` has no value for `{member}`")]
    MissingValue { type_path: String, member: String },
    #[error("`{type_path}` has no member `{member}`")]
    NoSuchMember { type_path: String, member: String },
    #[error("`{type_path}::{member}`: {source}")]
    Value {
        type_path: String,
        member: String,
        source: ValueError,
    },
    #[error("`{type_path}`: {reason}")]
    Invalid { type_path: String, reason: String },
}

// -----------------------------------------------------------------------------
// Aggregates

/// Failure of a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Failure while reading a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Required(#[from] RequiredFieldError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
    #[error("no marshaller is registered for `{0}`")]
    UnknownType(String),
    #[error("marshaller for `{expected}` produced a different type")]
    TypeMismatch { expected: String },
}

/// Failure while writing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Required(#[from] RequiredFieldError),
    #[error("no marshaller is registered for `{0}`")]
    UnknownType(String),
    #[error("`{type_name}::{field}`: value does not match the declared type")]
    ValueMismatch { type_name: String, field: String },
    #[error("expected an instance of `{expected}`")]
    InstanceMismatch { expected: String },
}
