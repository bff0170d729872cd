//! The bridge between native field values and the wire.
//!
//! Getters lend a [`ValueRef`] to the encoder, the decoder hands owned
//! [`Value`]s to a type's factory through [`FieldValues`]. [`ProtoField`]
//! converts between the two and native Rust types.

// -----------------------------------------------------------------------------
// Modules

mod field_values;
mod proto_field;
mod values;

// -----------------------------------------------------------------------------
// Exports

pub use field_values::FieldValues;
pub use proto_field::{OpenEnum, ProtoEnum, ProtoField};
pub use values::{Value, ValueRef};
