//! Adapters for foreign types the schema cannot annotate.
//!
//! Each adapter is a live [`TypeInfo`](crate::info::TypeInfo) whose
//! identity is the foreign type. Compilation units pick them up for
//! foreign references when closure expansion is on; they can also be
//! requested explicitly with [`CompilationUnit::add_type`].
//!
//! [`CompilationUnit::add_type`]: crate::compile::CompilationUnit::add_type

// -----------------------------------------------------------------------------
// Modules

mod arrays;
#[cfg(feature = "bigint")]
mod big_integer;

// -----------------------------------------------------------------------------
// Exports

pub use arrays::{boxed_boolean_array, boxed_double_array, boxed_integer_array, boxed_long_array};
#[cfg(feature = "bigint")]
#[cfg_attr(docsrs, doc(cfg(feature = "bigint")))]
pub use big_integer::big_integer;

use core::any::TypeId;
use std::sync::OnceLock;

use crate::info::TypeRef;

fn builtins() -> &'static [TypeRef] {
    static BUILTINS: OnceLock<Vec<TypeRef>> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let mut all = vec![
            arrays::integer_array(),
            arrays::long_array(),
            arrays::double_array(),
            arrays::boolean_array(),
        ];
        #[cfg(feature = "bigint")]
        all.push(big_integer::build());
        all
    })
}

/// The built-in adapter for a foreign type, if there is one.
pub fn builtin(type_id: TypeId) -> Option<TypeRef> {
    builtins().iter().find(|ty| ty.id() == type_id).cloned()
}

fn cached<T: core::any::Any>() -> TypeRef {
    builtin(TypeId::of::<T>()).unwrap_or_else(TypeRef::foreign::<T>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, FactoryError};
    use crate::prelude::*;

    fn arrays() -> ProtoRegistry {
        let mut registry = ProtoRegistry::new();
        CompilationUnit::new("arrays.proto")
            .package("adapters")
            .add_type(boxed_integer_array())
            .add_type(boxed_long_array())
            .add_type(boxed_double_array())
            .add_type(boxed_boolean_array())
            .compile(&mut registry)
            .unwrap();
        registry
    }

    #[test]
    fn builtins_are_shared() {
        let first = boxed_integer_array();
        assert_eq!(first.id(), TypeId::of::<Box<[i32]>>());
        assert_eq!(first.info().unwrap().proto_name(), "BoxedIntegerArray");
        assert!(builtin(TypeId::of::<Box<[u8]>>()).is_none());
    }

    #[test]
    fn round_trips_boxed_arrays() {
        let registry = arrays();
        assert!(registry.lookup_by_name("adapters.BoxedLongArray").is_some());

        let ints: Box<[i32]> = Box::new([5]);
        let bytes = registry.encode(&ints).unwrap();
        assert_eq!(bytes, [0x08, 0x01, 0x12, 0x01, 0x05]);
        assert_eq!(registry.decode::<Box<[i32]>>(&bytes).unwrap(), ints);

        let empty: Box<[f64]> = Box::new([]);
        assert!(registry.encode(&empty).unwrap().is_empty());
        assert_eq!(registry.decode::<Box<[f64]>>(&[]).unwrap(), empty);

        let flags: Box<[bool]> = Box::new([true, false, true]);
        let bytes = registry.encode(&flags).unwrap();
        assert_eq!(registry.decode::<Box<[bool]>>(&bytes).unwrap(), flags);
    }

    #[test]
    fn rejects_size_mismatch() {
        let registry = arrays();
        assert_eq!(
            registry.decode::<Box<[i32]>>(&[0x08, 0x03, 0x12, 0x01, 0x05]),
            Err(DecodeError::Factory(FactoryError::Invalid {
                type_path: "Box<[i32]>".into(),
                reason: "declared size 3 but 1 elements".into(),
            }))
        );
    }

    #[cfg(feature = "bigint")]
    #[test]
    fn encodes_foreign_fields_through_adapters() {
        use num_bigint::BigInt;

        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Ledger {
            #[proto(number = 1, foreign)]
            balance: BigInt,
            #[proto(number = 2, foreign)]
            history: Vec<BigInt>,
            #[proto(number = 3, foreign)]
            limit: Option<BigInt>,
            #[proto(number = 4, foreign)]
            samples: Box<[i32]>,
        }

        let mut registry = ProtoRegistry::new();
        let schema = CompilationUnit::new("ledger.proto")
            .package("bank")
            .add::<Ledger>()
            .compile(&mut registry)
            .unwrap();
        let names: Vec<_> = schema.file().types().iter().map(|d| d.qualified_name()).collect();
        assert_eq!(names, ["bank.Ledger", "bank.BigInteger", "bank.BoxedIntegerArray"]);

        let ledger = Ledger {
            balance: BigInt::from(-1),
            history: vec![BigInt::from(300), BigInt::from(0)],
            limit: None,
            samples: Box::new([1, 2]),
        };
        let bytes = registry.encode(&ledger).unwrap();
        assert_eq!(&bytes[..5], [0x0A, 0x03, 0x0A, 0x01, 0xFF]);
        assert_eq!(registry.decode::<Ledger>(&bytes).unwrap(), ledger);

        let big = BigInt::from(u128::MAX) * -3;
        let bytes = registry.encode(&big).unwrap();
        assert_eq!(registry.decode::<BigInt>(&bytes).unwrap(), big);
    }
}
