//! Parsing of `#[proto(...)]` and doc attributes.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Ident, Lit, LitBool, LitInt, LitStr, UnOp};

pub(crate) const PROTO_ATTRIBUTE_NAME: &str = "proto";

// -----------------------------------------------------------------------------
// Docs

/// Joins `///` comments into one string, one line each.
fn collect_docs(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(pair) => match &pair.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_owned).unwrap_or(line))
        .collect();
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn proto_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(PROTO_ATTRIBUTE_NAME))
}

fn parse_flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

/// A signed integer literal, `-` allowed.
fn parse_signed(expr: &Expr) -> Option<syn::Result<i64>> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => Some(int.base10_parse()),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_signed(expr).map(|r| r.map(|v| -v)),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Default literal

/// The literal of `#[proto(default = ...)]`.
#[derive(Debug, Clone)]
pub(crate) enum DefaultLit {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl DefaultLit {
    fn parse(expr: &Expr) -> syn::Result<Self> {
        if let Some(int) = parse_signed(expr) {
            return int.map(Self::Int);
        }
        let float = |expr: &Expr| match expr {
            Expr::Lit(ExprLit {
                lit: Lit::Float(f), ..
            }) => Some(f.base10_parse::<f64>()),
            _ => None,
        };
        match expr {
            Expr::Lit(ExprLit { lit, .. }) => match lit {
                Lit::Bool(b) => return Ok(Self::Bool(b.value)),
                Lit::Str(s) => return Ok(Self::Str(s.value())),
                Lit::Float(_) => {
                    if let Some(f) = float(expr) {
                        return f.map(Self::Float);
                    }
                }
                _ => {}
            },
            Expr::Unary(ExprUnary {
                op: UnOp::Neg(_),
                expr: inner,
                ..
            }) => {
                if let Some(f) = float(&**inner) {
                    return f.map(|v| Self::Float(-v));
                }
            }
            _ => {}
        }
        Err(syn::Error::new(
            expr.span(),
            "expected a bool, integer, float or string literal",
        ))
    }

    /// `DefaultLiteral::...` construction tokens.
    pub fn to_tokens(&self, info_: &TokenStream, exports_: &TokenStream) -> TokenStream {
        match self {
            Self::Bool(b) => quote!(#info_::DefaultLiteral::Bool(#b)),
            Self::Int(i) => quote!(#info_::DefaultLiteral::Int(#i)),
            Self::Float(f) => quote!(#info_::DefaultLiteral::Float(#f)),
            Self::Str(s) => quote!(#info_::DefaultLiteral::Str(#exports_::Cow::Borrowed(#s))),
        }
    }
}

// -----------------------------------------------------------------------------
// Scalar override

const SCALARS: &[(&str, &str)] = &[
    ("double", "Double"),
    ("float", "Float"),
    ("int32", "Int32"),
    ("int64", "Int64"),
    ("uint32", "UInt32"),
    ("uint64", "UInt64"),
    ("sint32", "SInt32"),
    ("sint64", "SInt64"),
    ("fixed32", "Fixed32"),
    ("fixed64", "Fixed64"),
    ("sfixed32", "SFixed32"),
    ("sfixed64", "SFixed64"),
    ("bool", "Bool"),
    ("string", "String"),
    ("bytes", "Bytes"),
];

fn parse_scalar(lit: &LitStr) -> syn::Result<Ident> {
    let name = lit.value();
    SCALARS
        .iter()
        .find(|(proto, _)| *proto == name)
        .map(|(_, variant)| Ident::new(variant, lit.span()))
        .ok_or_else(|| {
            syn::Error::new(lit.span(), format!("`{name}` is not a protobuf scalar type"))
        })
}

// -----------------------------------------------------------------------------
// Type attributes

/// `#[proto(name = "..", doc = "..")]` on a struct or enum.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub name: Option<LitStr>,
    pub docs: Option<String>,
}

impl TypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        let mut custom_docs = None;
        for attr in proto_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    set_once(&mut out.name, meta.value()?.parse()?, &meta)
                } else if meta.path.is_ident("doc") {
                    let docs: LitStr = meta.value()?.parse()?;
                    set_once(&mut custom_docs, docs.value(), &meta)
                } else {
                    Err(meta.error("unsupported type attribute, expected `name` or `doc`"))
                }
            })?;
        }
        out.docs = custom_docs.or_else(|| collect_docs(attrs));
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// Field attributes

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldRole {
    Field,
    Flatten,
    UnknownFields,
    Skip,
}

/// `#[proto(...)]` on a struct field.
pub(crate) struct FieldAttributes {
    pub role: FieldRole,
    pub number: Option<u32>,
    pub name: Option<LitStr>,
    pub required: bool,
    pub default: Option<DefaultLit>,
    pub scalar: Option<Ident>,
    pub packed: Option<bool>,
    pub oneof: Option<LitStr>,
    pub foreign: bool,
    pub docs: Option<String>,
}

impl FieldAttributes {
    pub fn parse(attrs: &[Attribute], span: Span) -> syn::Result<Self> {
        let mut role = None;
        let mut number = None;
        let mut name = None;
        let mut required = None;
        let mut default = None;
        let mut scalar = None;
        let mut packed = None;
        let mut oneof = None;
        let mut foreign = None;
        let mut custom_docs = None;

        for attr in proto_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                let path = &meta.path;
                if path.is_ident("number") {
                    let lit: LitInt = meta.value()?.parse()?;
                    set_once(&mut number, lit.base10_parse::<u32>()?, &meta)
                } else if path.is_ident("name") {
                    set_once(&mut name, meta.value()?.parse()?, &meta)
                } else if path.is_ident("required") {
                    let flag = parse_flag(&meta)?;
                    set_once(&mut required, flag, &meta)
                } else if path.is_ident("default") {
                    let expr: Expr = meta.value()?.parse()?;
                    set_once(&mut default, DefaultLit::parse(&expr)?, &meta)
                } else if path.is_ident("ty") {
                    let lit: LitStr = meta.value()?.parse()?;
                    set_once(&mut scalar, parse_scalar(&lit)?, &meta)
                } else if path.is_ident("packed") {
                    let flag = parse_flag(&meta)?;
                    set_once(&mut packed, flag, &meta)
                } else if path.is_ident("oneof") {
                    set_once(&mut oneof, meta.value()?.parse()?, &meta)
                } else if path.is_ident("foreign") {
                    set_once(&mut foreign, true, &meta)
                } else if path.is_ident("doc") {
                    let docs: LitStr = meta.value()?.parse()?;
                    set_once(&mut custom_docs, docs.value(), &meta)
                } else if path.is_ident("flatten") {
                    set_once(&mut role, FieldRole::Flatten, &meta)
                } else if path.is_ident("unknown_fields") {
                    set_once(&mut role, FieldRole::UnknownFields, &meta)
                } else if path.is_ident("skip") {
                    set_once(&mut role, FieldRole::Skip, &meta)
                } else {
                    Err(meta.error("unsupported field attribute"))
                }
            })?;
        }

        let role = role.unwrap_or(FieldRole::Field);
        let has_field_options = number.is_some()
            || name.is_some()
            || required.is_some()
            || default.is_some()
            || scalar.is_some()
            || packed.is_some()
            || oneof.is_some()
            || foreign.is_some();
        if role != FieldRole::Field && has_field_options {
            return Err(syn::Error::new(
                span,
                "`flatten`, `unknown_fields` and `skip` take no other field options",
            ));
        }
        if foreign.is_some() && scalar.is_some() {
            return Err(syn::Error::new(span, "a `foreign` field cannot override its scalar type"));
        }

        Ok(Self {
            role,
            number,
            name,
            required: required.unwrap_or(false),
            default,
            scalar,
            packed,
            oneof,
            foreign: foreign.unwrap_or(false),
            docs: custom_docs.or_else(|| collect_docs(attrs)),
        })
    }
}

// -----------------------------------------------------------------------------
// Variant attributes

/// `#[proto(number = .., name = "..", doc = "..")]` on an enum variant.
#[derive(Default)]
pub(crate) struct VariantAttributes {
    pub number: Option<i32>,
    pub name: Option<LitStr>,
    pub docs: Option<String>,
}

impl VariantAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        let mut custom_docs = None;
        for attr in proto_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("number") {
                    let expr: Expr = meta.value()?.parse()?;
                    let number = parse_i32(&expr)?;
                    set_once(&mut out.number, number, &meta)
                } else if meta.path.is_ident("name") {
                    set_once(&mut out.name, meta.value()?.parse()?, &meta)
                } else if meta.path.is_ident("doc") {
                    let docs: LitStr = meta.value()?.parse()?;
                    set_once(&mut custom_docs, docs.value(), &meta)
                } else {
                    Err(meta.error("unsupported variant attribute, expected `number`, `name` or `doc`"))
                }
            })?;
        }
        out.docs = custom_docs.or_else(|| collect_docs(attrs));
        Ok(out)
    }
}

/// An `i32` literal, as written in an attribute or a discriminant.
pub(crate) fn parse_i32(expr: &Expr) -> syn::Result<i32> {
    let value = parse_signed(expr)
        .ok_or_else(|| syn::Error::new(expr.span(), "expected an integer literal"))??;
    i32::try_from(value)
        .map_err(|_| syn::Error::new(expr.span(), "enum numbers must fit in an `i32`"))
}
