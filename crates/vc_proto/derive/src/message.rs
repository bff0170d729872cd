use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

use crate::attributes::{FieldAttributes, FieldRole, TypeAttributes};

/// How a `#[proto(foreign)]` field holds the foreign value.
enum ForeignShape<'a> {
    Bare(&'a Type),
    Optional(&'a Type),
    Repeated(&'a Type),
}

fn single_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };
    let last = path.path.segments.last()?;
    if last.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

impl<'a> ForeignShape<'a> {
    fn of(ty: &'a Type) -> Self {
        if let Some(inner) = single_argument(ty, "Option") {
            Self::Optional(inner)
        } else if let Some(inner) = single_argument(ty, "Vec") {
            Self::Repeated(inner)
        } else {
            Self::Bare(ty)
        }
    }
}

pub(crate) fn impl_message(input: &DeriveInput) -> syn::Result<TokenStream> {
    crate::reject_generics(input)?;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "`ProtoMessage` can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "`ProtoMessage` requires named fields",
        ));
    };

    let vc_proto_path = crate::path::vc_proto();
    let info_ = crate::path::info_(&vc_proto_path);
    let value_ = crate::path::value_(&vc_proto_path);
    let exports_ = crate::path::exports_(&vc_proto_path);
    let value_error_ = crate::path::value_error_(&vc_proto_path);
    let scalar_type_ = crate::path::scalar_type_(&vc_proto_path);

    let type_attrs = TypeAttributes::parse(&input.attrs)?;
    let ident = &input.ident;

    let mut members = Vec::new();
    let mut inits = Vec::new();
    let mut unknown_fields = None;
    let mut index = 0usize;

    for field in &fields.named {
        let Some(field_ident) = &field.ident else { continue };
        let attrs = FieldAttributes::parse(&field.attrs, field.span())?;
        let ty = &field.ty;
        let name = field_ident.to_string();

        match attrs.role {
            FieldRole::Skip => {
                inits.push(quote!(#field_ident: ::core::default::Default::default()));
                continue;
            }
            FieldRole::UnknownFields => {
                if unknown_fields.is_some() {
                    return Err(syn::Error::new(
                        field.span(),
                        "only one field can hold the unknown fields",
                    ));
                }
                unknown_fields = Some(quote! {
                    .with_unknown_fields(|value| {
                        value.downcast_ref::<Self>().map(|this| &this.#field_ident)
                    })
                });
                inits.push(quote!(#field_ident: values.take_unknown_fields()));
                continue;
            }
            FieldRole::Flatten => {
                members.push(quote! {
                    .with_member(#info_::MemberInfo::flatten(
                        #name,
                        #info_::TypeRef::of::<#ty>(),
                        |value| {
                            value
                                .downcast_ref::<Self>()
                                .map(|this| #value_::ValueRef::Message(&this.#field_ident))
                        },
                    ))
                });
                inits.push(quote!(#field_ident: values.take::<#ty>(#index)?));
                index += 1;
                continue;
            }
            FieldRole::Field => {}
        }

        let (field_type, to_value, init) = if attrs.foreign {
            match ForeignShape::of(ty) {
                ForeignShape::Bare(inner) => (
                    quote!(#info_::FieldType::Message(#info_::TypeRef::foreign::<#inner>())),
                    quote!(#value_::ValueRef::Message(&this.#field_ident)),
                    quote!(values.take_foreign::<#inner>(#index)?),
                ),
                ForeignShape::Optional(inner) => (
                    quote!(#info_::FieldType::Optional(#exports_::Box::new(
                        #info_::FieldType::Message(#info_::TypeRef::foreign::<#inner>())
                    ))),
                    quote!(#exports_::foreign_opt(&this.#field_ident)),
                    quote!(values.take_foreign_opt::<#inner>(#index)?),
                ),
                ForeignShape::Repeated(inner) => (
                    quote!(#info_::FieldType::Repeated(#exports_::Box::new(
                        #info_::FieldType::Message(#info_::TypeRef::foreign::<#inner>())
                    ))),
                    quote!(#exports_::foreign_vec(&this.#field_ident)),
                    quote!(values.take_foreign_vec::<#inner>(#index)?),
                ),
            }
        } else {
            (
                quote!(<#ty as #value_::ProtoField>::field_type()),
                quote!(<#ty as #value_::ProtoField>::to_value(&this.#field_ident)),
                quote!(values.take::<#ty>(#index)?),
            )
        };

        let mut options = Vec::new();
        if let Some(number) = attrs.number {
            options.push(quote!(.with_number(#number)));
        }
        if let Some(proto_name) = &attrs.name {
            options.push(quote!(.with_proto_name(#proto_name)));
        }
        if let Some(scalar) = &attrs.scalar {
            options.push(quote!(.with_scalar(#scalar_type_::#scalar)));
        }
        if attrs.required {
            options.push(quote!(.with_required(true)));
        }
        if let Some(default) = &attrs.default {
            let literal = default.to_tokens(&info_, &exports_);
            options.push(quote!(.with_default(#literal)));
        }
        if let Some(packed) = attrs.packed {
            options.push(quote!(.with_packed(#packed)));
        }
        if let Some(oneof) = &attrs.oneof {
            options.push(quote!(.with_oneof(#oneof)));
        }
        if let Some(docs) = &attrs.docs {
            options.push(quote!(.with_docs(#docs)));
        }

        members.push(quote! {
            .with_member(
                #info_::MemberInfo::field(
                    #name,
                    #field_type,
                    |value| value.downcast_ref::<Self>().map(|this| #to_value),
                )
                #(#options)*
            )
        });
        inits.push(quote!(#field_ident: #init));
        index += 1;
    }

    let proto_name = type_attrs
        .name
        .as_ref()
        .map(|name| quote!(.with_proto_name(#name)));
    let docs = type_attrs.docs.as_ref().map(|docs| quote!(.with_docs(#docs)));

    Ok(quote! {
        const _: () = {
            impl #info_::Typed for #ident {
                #[allow(unused_mut, unused_variables)]
                fn type_info() -> &'static #info_::TypeInfo {
                    static CELL: #info_::TypeInfoCell = #info_::TypeInfoCell::new();
                    CELL.get_or_init(|| {
                        #info_::TypeInfo::message::<Self>(
                            #info_::MessageInfo::new(|mut values: #value_::FieldValues| {
                                let value = Self { #(#inits,)* };
                                #exports_::Result::Ok(
                                    #exports_::Box::new(value) as #exports_::Box<dyn #exports_::Any>
                                )
                            })
                            #(#members)*
                            #unknown_fields
                        )
                        #proto_name
                        #docs
                    })
                }
            }

            impl #value_::ProtoField for #ident {
                #[inline]
                fn field_type() -> #info_::FieldType {
                    #info_::FieldType::Message(#info_::TypeRef::of::<Self>())
                }

                #[inline]
                fn to_value(&self) -> #value_::ValueRef<'_> {
                    #value_::ValueRef::Message(self)
                }

                #[inline]
                fn from_value(value: #value_::Value) -> #exports_::Result<Self, #value_error_> {
                    value.into_message::<Self>()
                }
            }
        };
    })
}
