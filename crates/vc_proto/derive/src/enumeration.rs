use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields};

use crate::attributes::{TypeAttributes, VariantAttributes, parse_i32};

pub(crate) fn impl_enum(input: &DeriveInput) -> syn::Result<TokenStream> {
    crate::reject_generics(input)?;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "`ProtoEnum` can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            input.ident.span(),
            "`ProtoEnum` requires at least one variant",
        ));
    }

    let vc_proto_path = crate::path::vc_proto();
    let info_ = crate::path::info_(&vc_proto_path);
    let value_ = crate::path::value_(&vc_proto_path);
    let exports_ = crate::path::exports_(&vc_proto_path);
    let value_error_ = crate::path::value_error_(&vc_proto_path);

    let type_attrs = TypeAttributes::parse(&input.attrs)?;
    let ident = &input.ident;

    let mut variant_infos = Vec::new();
    let mut from_arms = Vec::new();
    let mut to_arms = Vec::new();
    // Numbers follow Rust's discriminant rule unless overridden.
    let mut next = 0i32;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.fields.span(),
                "`ProtoEnum` variants cannot carry data",
            ));
        }
        let attrs = VariantAttributes::parse(&variant.attrs)?;
        let number = match (attrs.number, &variant.discriminant) {
            (Some(number), _) => number,
            (None, Some((_, expr))) => parse_i32(expr)?,
            (None, None) => next,
        };
        next = number.wrapping_add(1);

        let variant_ident = &variant.ident;
        let name = variant_ident.to_string();
        let proto_name = attrs.name.as_ref().map(|n| quote!(.with_proto_name(#n)));
        let docs = attrs.docs.as_ref().map(|d| quote!(.with_docs(#d)));

        variant_infos.push(quote! {
            .with_variant(#info_::VariantInfo::new(#name, #number) #proto_name #docs)
        });
        from_arms.push(quote!(#number => #exports_::Option::Some(Self::#variant_ident)));
        to_arms.push(quote!(Self::#variant_ident => #number));
    }

    let first = &data.variants[0].ident;
    let type_proto_name = type_attrs
        .name
        .as_ref()
        .map(|name| quote!(.with_proto_name(#name)));
    let type_docs = type_attrs.docs.as_ref().map(|docs| quote!(.with_docs(#docs)));

    Ok(quote! {
        const _: () = {
            impl #info_::Typed for #ident {
                fn type_info() -> &'static #info_::TypeInfo {
                    static CELL: #info_::TypeInfoCell = #info_::TypeInfoCell::new();
                    CELL.get_or_init(|| {
                        #info_::TypeInfo::enumeration::<Self>(
                            #info_::EnumInfo::new()
                                #(#variant_infos)*
                        )
                        #type_proto_name
                        #type_docs
                    })
                }
            }

            impl #value_::ProtoEnum for #ident {
                #[allow(unreachable_patterns)]
                fn from_number(number: i32) -> #exports_::Option<Self> {
                    match number {
                        #(#from_arms,)*
                        _ => #exports_::Option::None,
                    }
                }

                fn number(&self) -> i32 {
                    match self {
                        #(#to_arms,)*
                    }
                }
            }

            impl #value_::ProtoField for #ident {
                #[inline]
                fn field_type() -> #info_::FieldType {
                    #info_::FieldType::Enum {
                        ty: #info_::TypeRef::of::<Self>(),
                        open: false,
                    }
                }

                #[inline]
                fn to_value(&self) -> #value_::ValueRef<'_> {
                    #value_::ValueRef::Enum(<Self as #value_::ProtoEnum>::number(self))
                }

                #[inline]
                fn from_value(value: #value_::Value) -> #exports_::Result<Self, #value_error_> {
                    #exports_::enum_from_value::<Self>(value)
                }

                #[inline]
                fn missing() -> #exports_::Option<Self> {
                    #exports_::Option::Some(Self::#first)
                }
            }
        };
    })
}
