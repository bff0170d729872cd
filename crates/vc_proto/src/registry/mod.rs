//! The serialization context.
//!
//! A [`ProtoRegistry`] maps native types and qualified schema names to
//! descriptors and marshallers. It is append-only: an identity, once bound,
//! is never rebound to something different.
//!
//! [`SharedRegistry`] wraps one in a lock so several compilation units can
//! resolve concurrently and register one at a time.

// -----------------------------------------------------------------------------
// Modules

mod proto_registry;
mod shared;

// -----------------------------------------------------------------------------
// Exports

pub use proto_registry::{ProtoRegistry, RegisteredType};
pub use shared::SharedRegistry;
