//! Paths into `vc_proto` as seen from the deriving crate.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the access path to the `vc_proto` crate.
///
/// Resolved from the caller's `Cargo.toml`: `::vc_proto` for direct
/// dependents, `::vc_wire::proto` through the facade. Reading the manifest
/// is not cheap, so each derive resolves it once and passes it down.
pub(crate) fn vc_proto() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_proto"))
}

#[inline(always)]
pub(crate) fn info_(vc_proto_path: &syn::Path) -> TokenStream {
    quote! { #vc_proto_path::info }
}

#[inline(always)]
pub(crate) fn value_(vc_proto_path: &syn::Path) -> TokenStream {
    quote! { #vc_proto_path::value }
}

#[inline(always)]
pub(crate) fn exports_(vc_proto_path: &syn::Path) -> TokenStream {
    quote! { #vc_proto_path::__macro_exports }
}

#[inline(always)]
pub(crate) fn value_error_(vc_proto_path: &syn::Path) -> TokenStream {
    quote! { #vc_proto_path::error::ValueError }
}

#[inline(always)]
pub(crate) fn scalar_type_(vc_proto_path: &syn::Path) -> TokenStream {
    quote! { #vc_proto_path::schema::ScalarType }
}
