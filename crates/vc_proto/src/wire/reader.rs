use bytes::Buf;
use prost::encoding::decode_varint;

use super::{Tag, WireType};
use crate::error::WireError;

/// How deep messages may nest inside one top-level message.
pub const RECURSION_LIMIT: u32 = 100;

/// A forward-only cursor over protobuf bytes.
///
/// Every read checks the remaining length first, so truncated input yields
/// [`WireError::Truncated`] rather than a panic. The reader also tracks how
/// many message frames enclose it; see [`ProtoReader::nested`].
#[derive(Debug, Clone, Copy)]
pub struct ProtoReader<'a> {
    buf: &'a [u8],
    depth: u32,
}

impl<'a> ProtoReader<'a> {
    #[inline]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, depth: 0 }
    }

    /// A reader over a frame at the same nesting level, such as a packed
    /// run or a map entry.
    #[inline]
    pub const fn frame(&self, buf: &'a [u8]) -> Self {
        Self { buf, depth: self.depth }
    }

    /// A reader over a nested message frame.
    ///
    /// Fails with [`WireError::RecursionLimit`] once [`RECURSION_LIMIT`]
    /// levels are open.
    pub fn nested(&self, buf: &'a [u8]) -> Result<Self, WireError> {
        if self.depth >= RECURSION_LIMIT {
            return Err(WireError::RecursionLimit(RECURSION_LIMIT));
        }
        Ok(Self {
            buf,
            depth: self.depth + 1,
        })
    }

    #[inline]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// The unread input, used with [`ProtoReader::consumed_since`] to
    /// capture raw field bytes.
    #[inline]
    pub const fn mark(&self) -> &'a [u8] {
        self.buf
    }

    /// The bytes read since `mark` was taken.
    #[inline]
    pub fn consumed_since(&self, mark: &'a [u8]) -> &'a [u8] {
        &mark[..mark.len() - self.buf.len()]
    }

    fn need(&self, n: usize) -> Result<(), WireError> {
        if self.buf.len() < n {
            Err(WireError::Truncated {
                needed: n - self.buf.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        self.need(1)?;
        // A run of continuation bytes that hits the end is truncation,
        // anything else prost rejects is an overlong varint.
        if self.buf.len() < 10 && self.buf.iter().all(|b| b & 0x80 != 0) {
            return Err(WireError::Truncated { needed: 1 });
        }
        decode_varint(&mut self.buf).map_err(|_| WireError::InvalidVarint)
    }

    pub fn read_tag(&mut self) -> Result<Tag, WireError> {
        let key = self.read_varint()?;
        Tag::from_key(key)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        self.need(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Reads a length prefix and returns the framed bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::LengthOverflow(len))?;
        self.need(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Consumes one value of the given wire type without interpreting it.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.read_fixed64().map(drop),
            WireType::Fixed32 => self.read_fixed32().map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_varints_and_fixed() {
        let mut reader = ProtoReader::new(&[0xAC, 0x02, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(reader.read_varint(), Ok(300));
        assert_eq!(reader.read_fixed32(), Ok(1));
        assert!(reader.is_empty());
    }

    #[test]
    fn truncation_is_reported() {
        assert_eq!(
            ProtoReader::new(&[0x80, 0x80]).read_varint(),
            Err(WireError::Truncated { needed: 1 })
        );
        assert_eq!(
            ProtoReader::new(&[0x01, 0x02]).read_fixed32(),
            Err(WireError::Truncated { needed: 2 })
        );
        assert_eq!(
            ProtoReader::new(&[0x05, b'a']).read_length_delimited(),
            Err(WireError::Truncated { needed: 4 })
        );
        assert_eq!(
            ProtoReader::new(&[]).read_tag(),
            Err(WireError::Truncated { needed: 1 })
        );
    }

    #[test]
    fn consumed_since_captures_raw_field() {
        let input = [0x08, 0x96, 0x01, 0x10, 0x01];
        let mut reader = ProtoReader::new(&input);
        let mark = reader.mark();
        let tag = reader.read_tag().unwrap();
        reader.skip(tag.wire_type).unwrap();
        assert_eq!(reader.consumed_since(mark), &[0x08, 0x96, 0x01]);
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn nesting_is_bounded() {
        let mut reader = ProtoReader::new(&[]);
        for _ in 0..RECURSION_LIMIT {
            reader = reader.nested(&[]).unwrap();
        }
        assert_eq!(reader.depth(), RECURSION_LIMIT);
        assert_eq!(reader.frame(&[0x08]).depth(), RECURSION_LIMIT);
        assert_eq!(
            reader.nested(&[]).unwrap_err(),
            WireError::RecursionLimit(RECURSION_LIMIT)
        );
    }
}
