use super::{ProtoReader, ProtoWriter, Tag, WireType};

/// Fields a schema does not recognize, kept as raw wire bytes.
///
/// Entries keep their original order and encoding, so re-encoding a
/// message writes them back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnknownFieldSet {
    raw: Vec<u8>,
}

impl UnknownFieldSet {
    #[inline]
    pub const fn new() -> Self {
        Self { raw: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The concatenated raw fields.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Appends one complete field: tag and value, as read from the input.
    #[inline]
    pub fn push_raw(&mut self, field: &[u8]) {
        self.raw.extend_from_slice(field);
    }

    /// Appends a varint field.
    pub fn push_varint(&mut self, number: u32, value: u64) {
        let mut writer = ProtoWriter::new();
        writer.write_tag(number, WireType::Varint);
        writer.write_varint(value);
        self.raw.extend_from_slice(writer.as_bytes());
    }

    /// Field tags in stored order.
    ///
    /// The set only ever holds well formed fields, so parsing stops at the
    /// first error without reporting it.
    pub fn tags(&self) -> Vec<Tag> {
        let mut reader = ProtoReader::new(&self.raw);
        let mut tags = Vec::new();
        while !reader.is_empty() {
            let Ok(tag) = reader.read_tag() else { break };
            if reader.skip(tag.wire_type).is_err() {
                break;
            }
            tags.push(tag);
        }
        tags
    }

    pub(crate) fn write_to(&self, writer: &mut ProtoWriter) {
        writer.write_raw(&self.raw);
    }
}
