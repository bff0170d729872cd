//! Compilation units: requested types in, one schema file and its
//! registered marshallers out.
//!
//! Compilation runs in two steps. [`CompilationUnit::prepare`] only reads
//! the registry: it walks the closure of the requested types, decides for
//! each whether it is generated here or imported from an earlier schema,
//! builds descriptors and compiles marshallers. [`PreparedUnit::commit`]
//! then registers the whole file at once.

// -----------------------------------------------------------------------------
// Modules

mod closure;
mod entry;
mod unit;

// -----------------------------------------------------------------------------
// Exports

pub use entry::{CompiledSchema, SchemaEntry};
pub use unit::{CompilationUnit, PreparedUnit};

