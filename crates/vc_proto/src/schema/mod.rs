//! The schema model: files, messages, enums and fields.
//!
//! Descriptors are immutable once built and shared through [`Arc`](std::sync::Arc);
//! the registry and every marshaller hold the same instances.

// -----------------------------------------------------------------------------
// Modules

mod descriptor;
mod file;
mod scalar;

// -----------------------------------------------------------------------------
// Exports

pub use descriptor::{
    Cardinality, DefaultValue, Descriptor, EnumType, EnumValue, FieldDescriptor, MessageType,
    OneofGroup, ValueType,
};
pub use file::FileSchema;
pub use scalar::{ScalarKind, ScalarType};
