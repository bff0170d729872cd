//! Protobuf wire format primitives.
//!
//! Varints come from `prost::encoding`; everything above them (tags, fixed
//! width values, length-delimited frames, zigzag, unknown-field retention)
//! lives here.
//!
//! ## Menu
//!
//! - [`WireType`] and [`Tag`]
//! - [`ProtoReader`]: a cursor over an input slice.
//! - [`ProtoWriter`]: an output buffer.
//! - [`UnknownFieldSet`]: raw bytes of fields a schema does not know.

// -----------------------------------------------------------------------------
// Modules

mod reader;
mod unknown;
mod wire_type;
mod writer;

// -----------------------------------------------------------------------------
// Exports

pub use reader::{ProtoReader, RECURSION_LIMIT};
pub use unknown::UnknownFieldSet;
pub use wire_type::{MAX_FIELD_NUMBER, Tag, WireType};
pub use writer::ProtoWriter;

/// Zigzag maps signed integers to unsigned so that small magnitudes stay short.
#[inline]
pub const fn encode_zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
pub const fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline]
pub const fn encode_zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub const fn decode_zigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
