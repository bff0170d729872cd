use core::any::Any;
use std::borrow::Cow;

use bytes::Bytes;
use num_bigint::BigInt;

use crate::info::{FieldType, MemberInfo, MessageInfo, TypeInfo, TypeRef};
use crate::schema::ScalarType;
use crate::value::ValueRef;

/// The `BigInteger` adapter for [`BigInt`]: one `bytes` field holding the
/// two's-complement big-endian value.
pub fn big_integer() -> TypeRef {
    super::cached::<BigInt>()
}

pub(super) fn build() -> TypeRef {
    let message = MessageInfo::new(|mut values| {
        let bytes: Bytes = values.take_named("bytes")?;
        Ok(Box::new(BigInt::from_signed_bytes_be(&bytes)) as Box<dyn Any>)
    })
    .with_member(
        MemberInfo::field("bytes", FieldType::Scalar(ScalarType::Bytes), |value| {
            value
                .downcast_ref::<BigInt>()
                .map(|n| ValueRef::Bytes(Cow::Owned(n.to_signed_bytes_be())))
        })
        .with_number(1),
    )
    .with_factory_params(["bytes"]);

    TypeRef::dynamic(
        TypeInfo::message::<BigInt>(message)
            .with_adapter("BigIntegerAdapter")
            .with_proto_name("BigInteger"),
    )
}
