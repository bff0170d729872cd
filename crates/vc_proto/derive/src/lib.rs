//! Derive macros for `vc_proto`.
//!
//! - [`ProtoMessage`](derive_proto_message)
//! - [`ProtoEnum`](derive_proto_enum)
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod enumeration;
mod message;
mod path;

fn reject_generics(input: &DeriveInput) -> syn::Result<()> {
    if input.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            &input.generics,
            "proto types cannot be generic",
        ))
    }
}

// -----------------------------------------------------------------------------
// Macros

/// # Message derivation
///
/// `#[derive(ProtoMessage)]` implements `Typed` and `ProtoField` for a
/// struct with named fields, describing it as a protobuf message.
///
/// ```ignore
/// /// A person.
/// #[derive(ProtoMessage)]
/// #[proto(name = "Person")]
/// struct Person {
///     #[proto(number = 1, required)]
///     id: i32,
///     #[proto(number = 2, ty = "sint64", default = -1)]
///     score: i64,
///     #[proto(number = 3)]
///     tags: Vec<String>,
///     #[proto(number = 4, oneof = "contact")]
///     email: Option<String>,
///     #[proto(number = 5, oneof = "contact")]
///     phone: Option<String>,
///     #[proto(number = 6, foreign)]
///     balance: Option<num_bigint::BigInt>,
///     #[proto(flatten)]
///     base: Entity,
///     #[proto(unknown_fields)]
///     unknown: UnknownFieldSet,
///     #[proto(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// ## Type attributes
///
/// - `name = ".."`: schema name, the type's name by default.
/// - `doc = ".."`: schema docs, the `///` comments by default.
///
/// ## Field attributes
///
/// - `number = N`: field number, required on every field.
/// - `name = ".."`: schema field name, the Rust name by default.
/// - `required`: marks a scalar field as proto2 `required`.
/// - `default = lit`: value of an absent field. Enum defaults name a value.
/// - `ty = ".."`: scalar override with the same Rust value kind, such as
///   `sint32` or `fixed64`.
/// - `packed` / `packed = false`: packed encoding of a repeated scalar.
/// - `oneof = ".."`: oneof group; members must be `Option`s.
/// - `foreign`: the type has no `ProtoField` impl and is encoded by an
///   adapter. Supports `T`, `Option<T>` and `Vec<T>`.
/// - `flatten`: inlines the fields of another message at this position.
/// - `unknown_fields`: a `UnknownFieldSet` keeping unrecognized fields.
/// - `skip`: not serialized, built with `Default`.
/// - `doc = ".."`: schema docs, the `///` comments by default.
#[proc_macro_derive(ProtoMessage, attributes(proto))]
pub fn derive_proto_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    message::impl_message(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// # Enum derivation
///
/// `#[derive(ProtoEnum)]` implements `Typed`, `ProtoField` and `ProtoEnum`
/// for a fieldless enum.
///
/// Each variant's number is `#[proto(number = N)]`, else its explicit
/// discriminant, else one more than the previous variant's. Schema value
/// names default to the UPPER_SNAKE_CASE variant name; `#[proto(name = "..")]`
/// overrides it. The first variant is the value of an absent field.
///
/// ```ignore
/// #[derive(ProtoEnum, Clone, Copy)]
/// enum Level {
///     Low = 1,
///     #[proto(name = "HIGHEST")]
///     High,
/// }
/// ```
#[proc_macro_derive(ProtoEnum, attributes(proto))]
pub fn derive_proto_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    enumeration::impl_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
