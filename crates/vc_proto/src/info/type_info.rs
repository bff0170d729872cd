use core::any::{Any, TypeId};
use std::borrow::Cow;

use super::{EnumInfo, MessageInfo};

/// Where the schema metadata of a type comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The type describes itself.
    Owned,
    /// A separate adapter describes a type it does not own.
    Adapter { adapter: Cow<'static, str> },
}

#[derive(Debug)]
pub enum TypeKind {
    Message(MessageInfo),
    Enum(EnumInfo),
}

/// Everything the schema compiler needs to know about one native type.
///
/// For adapters, [`TypeInfo::id`] and [`TypeInfo::type_path`] are those of
/// the adapted (foreign) type.
#[derive(Debug)]
pub struct TypeInfo {
    id: TypeId,
    type_path: Cow<'static, str>,
    type_name: Cow<'static, str>,
    proto_name: Option<Cow<'static, str>>,
    docs: Option<Cow<'static, str>>,
    origin: Origin,
    kind: TypeKind,
}

// `a::b::Foo<c::Bar>` -> `Foo`
fn simple_name(path: &'static str) -> &'static str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base)
}

impl TypeInfo {
    fn new<T: Any>(kind: TypeKind) -> Self {
        let type_path = core::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            type_path: Cow::Borrowed(type_path),
            type_name: Cow::Borrowed(simple_name(type_path)),
            proto_name: None,
            docs: None,
            origin: Origin::Owned,
            kind,
        }
    }

    #[inline]
    pub fn message<T: Any>(info: MessageInfo) -> Self {
        Self::new::<T>(TypeKind::Message(info))
    }

    #[inline]
    pub fn enumeration<T: Any>(info: EnumInfo) -> Self {
        Self::new::<T>(TypeKind::Enum(info))
    }

    /// Marks this info as an adapter describing `T`, named `adapter`.
    #[inline]
    pub fn with_adapter(mut self, adapter: impl Into<Cow<'static, str>>) -> Self {
        self.origin = Origin::Adapter {
            adapter: adapter.into(),
        };
        self
    }

    /// Overrides the schema name, which otherwise is the simple type name.
    #[inline]
    pub fn with_proto_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.proto_name = Some(name.into());
        self
    }

    /// Overrides the native path used in messages.
    #[inline]
    pub fn with_type_path(mut self, path: &'static str) -> Self {
        self.type_path = Cow::Borrowed(path);
        self.type_name = Cow::Borrowed(simple_name(path));
        self
    }

    #[inline]
    pub fn with_docs(mut self, docs: impl Into<Cow<'static, str>>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified native path.
    #[inline]
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    #[inline]
    pub(crate) fn type_path_cow(&self) -> Cow<'static, str> {
        self.type_path.clone()
    }

    /// The native name without module path or generics.
    #[inline]
    pub fn name(&self) -> &str {
        &self.type_name
    }

    /// The schema name: the override if present, else [`TypeInfo::name`].
    #[inline]
    pub fn proto_name(&self) -> &str {
        self.proto_name.as_deref().unwrap_or(&self.type_name)
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    #[inline]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn as_message(&self) -> Option<&MessageInfo> {
        match &self.kind {
            TypeKind::Message(info) => Some(info),
            TypeKind::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match &self.kind {
            TypeKind::Enum(info) => Some(info),
            TypeKind::Message(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::VariantInfo;

    #[allow(dead_code, reason = "type name only")]
    struct Wrapper<T>(T);

    #[test]
    fn names_strip_paths_and_generics() {
        let variants = EnumInfo::new().with_variant(VariantInfo::new("A", 0));
        let info = TypeInfo::enumeration::<Wrapper<String>>(variants);
        assert_eq!(info.name(), "Wrapper");
        assert!(info.type_path().ends_with("Wrapper<alloc::string::String>"));
        assert_eq!(info.proto_name(), "Wrapper");
        assert_eq!(info.with_proto_name("W").proto_name(), "W");
    }

    #[test]
    fn adapters_keep_foreign_identity() {
        let info = TypeInfo::enumeration::<u8>(EnumInfo::new()).with_adapter("ByteAdapter");
        assert_eq!(info.id(), TypeId::of::<u8>());
        assert_eq!(
            info.origin(),
            &Origin::Adapter {
                adapter: "ByteAdapter".into()
            }
        );
    }
}
