use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{TypeInfo, Typed};

#[derive(Clone)]
enum Source {
    Static(fn() -> &'static TypeInfo),
    Dynamic(Arc<TypeInfo>),
    Foreign(&'static str),
}

/// A handle to a candidate type.
///
/// Identity is the native [`TypeId`]: two handles on the same type compare
/// equal whatever their source. A handle created with [`TypeRef::foreign`]
/// carries no [`TypeInfo`]; it resolves through an adapter or an already
/// registered marshaller.
#[derive(Clone)]
pub struct TypeRef {
    id: TypeId,
    source: Source,
}

impl TypeRef {
    /// A handle whose info is produced lazily by [`Typed::type_info`].
    ///
    /// Lazy access lets recursive types refer to themselves.
    #[inline]
    pub fn of<T: Typed>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            source: Source::Static(T::type_info),
        }
    }

    /// A handle owning info built at runtime.
    #[inline]
    pub fn dynamic(info: TypeInfo) -> Self {
        Self {
            id: info.id(),
            source: Source::Dynamic(Arc::new(info)),
        }
    }

    /// A handle to a type that cannot describe itself.
    #[inline]
    pub fn foreign<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            source: Source::Foreign(core::any::type_name::<T>()),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn info(&self) -> Option<&TypeInfo> {
        match &self.source {
            Source::Static(f) => Some(f()),
            Source::Dynamic(info) => Some(&**info),
            Source::Foreign(_) => None,
        }
    }

    #[inline]
    pub fn is_foreign(&self) -> bool {
        matches!(self.source, Source::Foreign(_))
    }

    pub fn type_path(&self) -> &str {
        match &self.source {
            Source::Static(f) => f().type_path(),
            Source::Dynamic(info) => info.type_path(),
            Source::Foreign(path) => *path,
        }
    }
}

impl PartialEq for TypeRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.type_path())
    }
}
