//! The type abstraction layer.
//!
//! Everything above this module sees candidate types only through
//! [`TypeRef`] and [`TypeInfo`]. A [`TypeInfo`] is assembled the same way
//! whether it comes from `#[derive(ProtoMessage)]` (static, built once and
//! cached) or is put together at runtime (dynamic, e.g. adapters for
//! foreign types).
//!
//! ## Menu
//!
//! - [`TypeRef`]: identity handle of a candidate type.
//! - [`TypeInfo`]: names, docs, origin and shape of a type.
//! - [`MessageInfo`] / [`MemberInfo`]: members, their metadata and accessors.
//! - [`EnumInfo`] / [`VariantInfo`]: enum values.
//! - [`FieldType`]: the shape of a member's value.
//! - [`Typed`]: static access to a type's [`TypeInfo`].

// -----------------------------------------------------------------------------
// Modules

mod enum_info;
mod field_type;
mod message_info;
mod type_info;
mod type_ref;
mod typed;

// -----------------------------------------------------------------------------
// Exports

pub use enum_info::{EnumInfo, VariantInfo};
pub use field_type::FieldType;
pub use message_info::{
    DefaultLiteral, Factory, Getter, MemberInfo, MemberKind, MessageInfo, UnknownFieldsAccessor,
};
pub use type_info::{Origin, TypeInfo, TypeKind};
pub use type_ref::TypeRef;
pub use typed::{TypeInfoCell, Typed};
