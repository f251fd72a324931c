//! Escher record header codec.
//!
//! # Format
//!
//! Every Escher record starts with an 8-byte header:
//! - Bytes 0-1: Version (low 4 bits) | Instance (high 12 bits)
//! - Bytes 2-3: Record Type
//! - Bytes 4-7: Record Length (bytes following the header)
//!
//! A version nibble of `0xF` marks a container record.

use crate::common::binary::ByteWriter;
use crate::common::error::{DecodeError, EncodeResult, Result};
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::*;

/// Size of the record header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Version nibble marking a container record.
pub const CONTAINER_VERSION: u8 = 0x0F;

/// On-disk header layout - zerocopy compatible
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
struct RawHeader {
    options: U16<LittleEndian>,
    record_id: U16<LittleEndian>,
    length: U32<LittleEndian>,
}

/// Decoded Escher record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// Version (4 bits)
    pub version: u8,
    /// Instance (12 bits)
    pub instance: u16,
    /// Raw record type id
    pub record_id: u16,
    /// Declared body length; may disagree with the buffer on corrupt input
    pub length: u32,
}

impl RecordHeader {
    pub const fn new(version: u8, instance: u16, record_id: u16, length: u32) -> Self {
        Self {
            version: version & 0x0F,
            instance: instance & 0x0FFF,
            record_id,
            length,
        }
    }

    pub const fn container(record_id: u16, length: u32) -> Self {
        Self::new(CONTAINER_VERSION, 0, record_id, length)
    }

    /// Combined options word (version | instance << 4).
    #[inline]
    pub const fn options(&self) -> u16 {
        ((self.instance & 0x0FFF) << 4) | (self.version as u16 & 0x0F)
    }

    /// Container records have version 0xF (15).
    #[inline]
    pub const fn is_container(&self) -> bool {
        self.version == CONTAINER_VERSION
    }

    /// Decode a header at `offset`.
    ///
    /// Returns the header and whether it marks a container. Fails with
    /// `TruncatedInput` when fewer than 8 bytes remain; nothing else is
    /// validated here.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, bool)> {
        let available = data.len().saturating_sub(offset);
        let bytes = data
            .get(offset..)
            .and_then(|rest| rest.get(..HEADER_SIZE))
            .ok_or_else(|| DecodeError::truncated(offset, HEADER_SIZE, available))?;

        let raw = RawHeader::read_from_bytes(bytes)
            .map_err(|_| DecodeError::truncated(offset, HEADER_SIZE, available))?;
        let options = raw.options.get();

        let header = Self {
            version: (options & 0x000F) as u8,
            instance: (options >> 4) & 0x0FFF,
            record_id: raw.record_id.get(),
            length: raw.length.get(),
        };
        Ok((header, header.is_container()))
    }

    /// Encode the header at `offset`; always writes exactly 8 bytes.
    pub fn encode(&self, buf: &mut [u8], offset: usize) -> EncodeResult<usize> {
        let mut writer = ByteWriter::new(buf, offset);
        self.write(&mut writer)?;
        Ok(HEADER_SIZE)
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        let raw = RawHeader {
            options: U16::new(self.options()),
            record_id: U16::new(self.record_id),
            length: U32::new(self.length),
        };
        writer.put_bytes(raw.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::EncodeError;

    #[test]
    fn test_decode_container_header() {
        let data = [0x0F, 0x00, 0x02, 0xF0, 0x10, 0x00, 0x00, 0x00];
        let (header, is_container) = RecordHeader::decode(&data, 0).unwrap();
        assert!(is_container);
        assert_eq!(header.version, 0x0F);
        assert_eq!(header.instance, 0);
        assert_eq!(header.record_id, 0xF002);
        assert_eq!(header.length, 16);
    }

    #[test]
    fn test_decode_instance_and_version() {
        // Opt record: version 3, 4 properties
        let data = [0x00, 0x00, 0x43, 0x00, 0x0B, 0xF0, 0x18, 0x00, 0x00, 0x00];
        let (header, is_container) = RecordHeader::decode(&data, 2).unwrap();
        assert!(!is_container);
        assert_eq!(header.version, 3);
        assert_eq!(header.instance, 4);
        assert_eq!(header.record_id, 0xF00B);
        assert_eq!(header.length, 24);
    }

    #[test]
    fn test_decode_truncated() {
        let data = [0x0F, 0x00, 0x02, 0xF0, 0x10];
        assert_eq!(
            RecordHeader::decode(&data, 0),
            Err(DecodeError::TruncatedInput {
                offset: 0,
                needed: 8,
                available: 5
            })
        );
        assert!(RecordHeader::decode(&data, 10).is_err());
    }

    #[test]
    fn test_encode_header() {
        let header = RecordHeader::new(2, 0x0CA, 0xF00A, 8);
        let mut buf = [0u8; 10];
        assert_eq!(header.encode(&mut buf, 1).unwrap(), 8);
        assert_eq!(&buf[1..9], &[0xA2, 0x0C, 0x0A, 0xF0, 0x08, 0x00, 0x00, 0x00]);

        let (decoded, _) = RecordHeader::decode(&buf, 1).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_encode_short_buffer() {
        let header = RecordHeader::container(0xF004, 0);
        let mut buf = [0u8; 7];
        assert_eq!(
            header.encode(&mut buf, 0),
            Err(EncodeError::BufferTooSmall {
                needed: 8,
                available: 7
            })
        );
    }
}
