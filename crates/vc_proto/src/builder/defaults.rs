use super::naming::enum_value_name;
use crate::info::{DefaultLiteral, TypeRef};
use crate::schema::{DefaultValue, ScalarKind};

/// What a default is checked against.
pub(super) enum DefaultTarget<'a> {
    Scalar(ScalarKind),
    Enum(&'a TypeRef),
}

/// Checks a literal against the field's value type and normalizes it.
pub(super) fn convert(
    literal: &DefaultLiteral,
    target: DefaultTarget<'_>,
) -> Result<DefaultValue, String> {
    use DefaultLiteral as L;
    use ScalarKind as K;

    let out_of_range = |kind: K| format!("{literal:?} is out of range for {kind}");

    match target {
        DefaultTarget::Scalar(kind) => match (kind, literal) {
            (K::Bool, L::Bool(b)) => Ok(DefaultValue::Bool(*b)),
            (K::I32, L::Int(i)) => i32::try_from(*i)
                .map(|v| DefaultValue::Int(v.into()))
                .map_err(|_| out_of_range(kind)),
            (K::I64, L::Int(i)) => Ok(DefaultValue::Int(*i)),
            (K::U32, L::Int(i)) => u32::try_from(*i)
                .map(|v| DefaultValue::UInt(v.into()))
                .map_err(|_| out_of_range(kind)),
            (K::U64, L::Int(i)) => u64::try_from(*i)
                .map(DefaultValue::UInt)
                .map_err(|_| out_of_range(kind)),
            (K::F32 | K::F64, L::Float(f)) => Ok(DefaultValue::Float(*f)),
            (K::F32 | K::F64, L::Int(i)) => Ok(DefaultValue::Float(*i as f64)),
            (K::String, L::Str(s)) => Ok(DefaultValue::String(s.to_string())),
            (K::Bytes, L::Str(s)) => Ok(DefaultValue::Bytes(s.as_bytes().to_vec())),
            (kind, literal) => Err(format!("{literal:?} is not a {kind} value")),
        },
        DefaultTarget::Enum(ty) => {
            let Some(variants) = ty.info().and_then(|info| info.as_enum()) else {
                return Err(format!("`{}` has no known values", ty.type_path()));
            };
            let found = variants.variants().iter().find(|v| match literal {
                L::Str(name) => enum_value_name(v) == *name || v.name() == *name,
                L::Int(n) => i64::from(v.number()) == *n,
                _ => false,
            });
            match found {
                Some(v) => Ok(DefaultValue::Enum {
                    name: enum_value_name(v),
                    number: v.number(),
                }),
                None => Err(format!("{literal:?} is not a value of `{}`", ty.type_path())),
            }
        }
    }
}
