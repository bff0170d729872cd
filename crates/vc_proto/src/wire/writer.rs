use bytes::BufMut;
use prost::encoding::encode_varint;

use super::{Tag, WireType};

/// An append-only protobuf output buffer.
#[derive(Debug, Default, Clone)]
pub struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    #[inline]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn write_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buf);
    }

    #[inline]
    pub fn write_tag(&mut self, number: u32, wire_type: WireType) {
        self.write_varint(Tag::new(number, wire_type).key());
    }

    #[inline]
    pub fn write_fixed32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    #[inline]
    pub fn write_fixed64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    /// Writes a length prefix followed by `bytes`.
    #[inline]
    pub fn write_length_delimited(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.put_slice(bytes);
    }

    /// Appends bytes that are already wire encoded.
    #[inline]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Writes a length-delimited frame whose content is produced by `f`.
    pub fn write_frame<E>(
        &mut self,
        f: impl FnOnce(&mut ProtoWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut nested = ProtoWriter::new();
        f(&mut nested)?;
        self.write_length_delimited(&nested.buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_length_prefixed() {
        let mut writer = ProtoWriter::new();
        writer.write_tag(3, WireType::LengthDelimited);
        writer
            .write_frame(|w| {
                w.write_tag(1, WireType::Varint);
                w.write_varint(150);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(writer.as_bytes(), &[0x1A, 0x03, 0x08, 0x96, 0x01]);
    }
}
