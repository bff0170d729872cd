use super::TypeRef;
use crate::schema::ScalarType;

/// The shape of a member's value as seen by the schema compiler.
///
/// The metadata builder turns this into a cardinality and a value type;
/// shapes without a protobuf counterpart (such as a repeated optional) are
/// rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarType),
    /// `open` enums keep numbers the native enum does not declare.
    Enum { ty: TypeRef, open: bool },
    Message(TypeRef),
    Optional(Box<FieldType>),
    Repeated(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    /// Every message or enum this shape refers to.
    pub fn referenced_types(&self) -> Vec<&TypeRef> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a TypeRef>) {
        match self {
            Self::Scalar(_) => {}
            Self::Enum { ty, .. } | Self::Message(ty) => out.push(ty),
            Self::Optional(inner) | Self::Repeated(inner) => inner.collect_refs(out),
            Self::Map(key, value) => {
                key.collect_refs(out);
                value.collect_refs(out);
            }
        }
    }
}
