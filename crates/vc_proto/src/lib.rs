#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Required to make proc macros work in this crate's own tests.
extern crate self as vc_proto;

// -----------------------------------------------------------------------------
// Modules

pub mod adapters;
pub mod builder;
pub mod collections;
pub mod compile;
pub mod error;
pub mod info;
pub mod marshal;
pub mod registry;
pub mod schema;
pub mod value;
pub mod wire;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Exports

pub use vc_proto_derive::{ProtoEnum, ProtoMessage};

/// The common imports.
pub mod prelude {
    pub use crate::compile::{CompilationUnit, CompiledSchema};
    pub use crate::info::{TypeRef, Typed};
    pub use crate::registry::{ProtoRegistry, SharedRegistry};
    pub use crate::value::{OpenEnum, ProtoEnum, ProtoField};
    pub use crate::wire::UnknownFieldSet;
    pub use crate::{ProtoEnum, ProtoMessage};
}
