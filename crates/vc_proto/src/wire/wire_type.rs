use core::fmt;

use crate::error::WireError;

/// The largest field number the wire format can carry, `2^29 - 1`.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The low three bits of a tag.
///
/// Group wire types (3 and 4) are rejected as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    #[inline]
    pub const fn from_bits(bits: u8) -> Result<Self, WireError> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::UnknownWireType(other)),
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length-delimited",
            Self::Fixed32 => "fixed32",
        })
    }
}

/// A field key: `(number << 3) | wire_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub number: u32,
    pub wire_type: WireType,
}

impl Tag {
    #[inline]
    pub const fn new(number: u32, wire_type: WireType) -> Self {
        Self { number, wire_type }
    }

    /// Splits a raw key. Field number 0 and numbers above
    /// [`MAX_FIELD_NUMBER`] are invalid.
    pub const fn from_key(key: u64) -> Result<Self, WireError> {
        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(WireError::InvalidTag(key));
        }
        match WireType::from_bits((key & 0b111) as u8) {
            Ok(wire_type) => Ok(Self {
                number: number as u32,
                wire_type,
            }),
            Err(e) => Err(e),
        }
    }

    #[inline]
    pub const fn key(self) -> u64 {
        ((self.number as u64) << 3) | self.wire_type.bits() as u64
    }
}
