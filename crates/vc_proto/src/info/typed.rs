use core::any::Any;
use std::sync::OnceLock;

use super::TypeInfo;

/// Static access to a type's [`TypeInfo`].
///
/// Implemented by `#[derive(ProtoMessage)]` and `#[derive(ProtoEnum)]`.
/// The info is built on first access and lives for the whole program.
pub trait Typed: Any {
    fn type_info() -> &'static TypeInfo;
}

/// Storage for a non-generic type's [`TypeInfo`].
///
/// ```
/// use vc_proto::info::{EnumInfo, TypeInfo, TypeInfoCell, Typed, VariantInfo};
///
/// enum Level { Low }
///
/// impl Typed for Level {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: TypeInfoCell = TypeInfoCell::new();
///         CELL.get_or_init(|| {
///             let variants = EnumInfo::new().with_variant(VariantInfo::new("Low", 0));
///             TypeInfo::enumeration::<Self>(variants)
///         })
///     }
/// }
///
/// assert_eq!(Level::type_info().name(), "Level");
/// ```
pub struct TypeInfoCell(OnceLock<TypeInfo>);

impl TypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        self.0.get_or_init(f)
    }
}
