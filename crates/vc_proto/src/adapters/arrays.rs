use core::any::Any;

use crate::error::FactoryError;
use crate::info::{FieldType, MemberInfo, MessageInfo, TypeInfo, TypeRef};
use crate::schema::ScalarType;
use crate::value::{FieldValues, ValueRef};

// Every array adapter has a `size` (1) and the `elements` (2); the factory
// rejects a size that disagrees with the element count.
macro_rules! array_adapter {
    (
        $build:ident,
        $public:ident,
        $elem:ty,
        $scalar:ident,
        $variant:ident,
        $name:literal,
        $adapter:literal $(,)?
    ) => {
        #[doc = concat!("The `", $name, "` adapter for `Box<[", stringify!($elem), "]>`.")]
        pub fn $public() -> TypeRef {
            super::cached::<Box<[$elem]>>()
        }

        pub(super) fn $build() -> TypeRef {
            let message = MessageInfo::new(|mut values: FieldValues| {
                let size: u32 = values.take(0)?;
                let elements: Vec<$elem> = values.take(1)?;
                check_size(&values, size, elements.len())?;
                Ok(Box::new(elements.into_boxed_slice()) as Box<dyn Any>)
            })
            .with_member(
                MemberInfo::field("size", FieldType::Scalar(ScalarType::UInt32), |value| {
                    let array = value.downcast_ref::<Box<[$elem]>>()?;
                    u32::try_from(array.len()).ok().map(ValueRef::U32)
                })
                .with_number(1),
            )
            .with_member(
                MemberInfo::field(
                    "elements",
                    FieldType::Repeated(Box::new(FieldType::Scalar(ScalarType::$scalar))),
                    |value| {
                        let array = value.downcast_ref::<Box<[$elem]>>()?;
                        Some(ValueRef::List(array.iter().map(|v| ValueRef::$variant(*v)).collect()))
                    },
                )
                .with_number(2),
            );

            TypeRef::dynamic(
                TypeInfo::message::<Box<[$elem]>>(message)
                    .with_adapter($adapter)
                    .with_proto_name($name)
                    .with_type_path(concat!("Box<[", stringify!($elem), "]>")),
            )
        }
    };
}

fn check_size(values: &FieldValues, size: u32, len: usize) -> Result<(), FactoryError> {
    if usize::try_from(size).is_ok_and(|size| size == len) {
        return Ok(());
    }
    Err(FactoryError::Invalid {
        type_path: values.type_path().to_owned(),
        reason: format!("declared size {size} but {len} elements"),
    })
}

array_adapter!(
    integer_array,
    boxed_integer_array,
    i32,
    Int32,
    I32,
    "BoxedIntegerArray",
    "BoxedIntegerArrayAdapter",
);
array_adapter!(
    long_array,
    boxed_long_array,
    i64,
    Int64,
    I64,
    "BoxedLongArray",
    "BoxedLongArrayAdapter",
);
array_adapter!(
    double_array,
    boxed_double_array,
    f64,
    Double,
    F64,
    "BoxedDoubleArray",
    "BoxedDoubleArrayAdapter",
);
array_adapter!(
    boolean_array,
    boxed_boolean_array,
    bool,
    Bool,
    Bool,
    "BoxedBooleanArray",
    "BoxedBooleanArrayAdapter",
);
