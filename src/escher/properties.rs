//! Escher shape property codec (Opt record tables).
//!
//! Properties control shape appearance: position, size, colors, rotation, etc.
//! Based on MS-ODRAW specification section 2.3.
//!
//! # Complex Properties
//!
//! Properties can be simple (4-byte value) or complex (variable-length data).
//! The table is laid out in two phases and must be read and written that way:
//! 1. Every property's 6-byte entry (id word + value or payload length)
//! 2. The payloads of all complex properties, in table order
//!
//! Processing a payload eagerly right after its entry misaligns any table
//! with two or more complex properties.

use super::context::DecodeContext;
use super::limits::DecodeLimits;
use super::property_names::{is_array_property, property_name};
use crate::common::binary::{ByteWriter, read_i16_le, read_u16_le, read_u32_le};
use crate::common::error::{DecodeError, EncodeResult, Result};
use bitflags::bitflags;
use std::fmt;

/// Size of a property entry in the first phase.
pub const PROPERTY_ENTRY_SIZE: usize = 6;

/// Size of the header that prefixes array property payloads.
pub const ARRAY_HEADER_SIZE: usize = 6;

bitflags! {
    /// Flag bits of the property id word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u16 {
        /// Value is a BLIP store index
        const BLIP_ID = 0x4000;
        /// Value is the length of a trailing payload
        const COMPLEX = 0x8000;
    }
}

/// Raw property id word: 14-bit property number plus flag bits.
///
/// Ordering follows the raw word, which is the order property tables are
/// kept in after mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u16);

impl PropertyId {
    pub const NUMBER_MASK: u16 = 0x3FFF;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn new(number: u16, flags: PropertyFlags) -> Self {
        Self((number & Self::NUMBER_MASK) | flags.bits())
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Property number without flags.
    #[inline]
    pub const fn number(self) -> u16 {
        self.0 & Self::NUMBER_MASK
    }

    #[inline]
    pub const fn flags(self) -> PropertyFlags {
        PropertyFlags::from_bits_truncate(self.0)
    }

    #[inline]
    pub const fn is_complex(self) -> bool {
        self.0 & PropertyFlags::COMPLEX.bits() != 0
    }

    #[inline]
    pub const fn is_blip_id(self) -> bool {
        self.0 & PropertyFlags::BLIP_ID.bits() != 0
    }
}

/// Array payload of a complex property (vertices, segment info, ...).
///
/// Payload layout: element count (u16), in-memory count (u16), element size
/// (i16, negative values encode `(-size) >> 2`), then the elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayProperty {
    id: PropertyId,
    data: Vec<u8>,
    size_includes_header: bool,
}

impl ArrayProperty {
    /// Empty array with the given element size.
    pub fn new(number: u16, element_size: u16) -> Self {
        let mut data = Vec::with_capacity(ARRAY_HEADER_SIZE);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&element_size.to_le_bytes());
        Self {
            id: PropertyId::new(number, PropertyFlags::COMPLEX),
            data,
            size_includes_header: true,
        }
    }

    /// Wrap a complete array payload (header included) as stored on disk.
    pub fn from_raw(id: PropertyId, data: Vec<u8>, size_includes_header: bool) -> Self {
        Self {
            id: PropertyId::from_raw(id.raw() | PropertyFlags::COMPLEX.bits()),
            data,
            size_includes_header,
        }
    }

    #[inline]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    #[inline]
    pub fn element_count(&self) -> u16 {
        read_u16_le(&self.data, 0).unwrap_or(0)
    }

    #[inline]
    pub fn element_count_in_memory(&self) -> u16 {
        read_u16_le(&self.data, 2).unwrap_or(0)
    }

    #[inline]
    pub fn raw_element_size(&self) -> i16 {
        read_i16_le(&self.data, 4).unwrap_or(0)
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        element_size_from_raw(self.raw_element_size())
    }

    /// Whether the length in the property entry counts the 6-byte header.
    #[inline]
    pub fn size_includes_header(&self) -> bool {
        self.size_includes_header
    }

    pub fn element(&self, index: usize) -> Option<&[u8]> {
        if index >= self.element_count() as usize {
            return None;
        }
        let size = self.element_size();
        let start = ARRAY_HEADER_SIZE + index * size;
        self.data.get(start..start + size)
    }

    pub fn elements(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.element_count() as usize).filter_map(move |i| self.element(i))
    }

    /// Append one element; its length must equal the element size.
    pub fn push_element(&mut self, element: &[u8]) -> bool {
        if self.data.len() < ARRAY_HEADER_SIZE || element.len() != self.element_size() {
            return false;
        }
        let count = self.element_count().wrapping_add(1);
        self.data[0..2].copy_from_slice(&count.to_le_bytes());
        self.data[2..4].copy_from_slice(&count.to_le_bytes());
        self.data.extend_from_slice(element);
        true
    }

    /// Payload bytes including the array header.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Length written into the property entry.
    fn declared_len(&self) -> usize {
        if self.size_includes_header || self.data.len() < ARRAY_HEADER_SIZE {
            self.data.len()
        } else {
            self.data.len() - ARRAY_HEADER_SIZE
        }
    }
}

#[inline]
fn element_size_from_raw(size: i16) -> usize {
    if size < 0 {
        ((-(size as i32)) >> 2) as usize
    } else {
        size as usize
    }
}

/// A single Escher property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscherProperty {
    /// 4-byte inline value
    Simple { id: PropertyId, value: i32 },
    /// Opaque variable-length payload
    Complex { id: PropertyId, data: Vec<u8> },
    /// Structured array payload
    Array(ArrayProperty),
}

impl EscherProperty {
    pub fn simple(number: u16, value: i32) -> Self {
        Self::Simple {
            id: PropertyId::new(number, PropertyFlags::empty()),
            value,
        }
    }

    /// Simple property whose value references a BLIP store entry.
    pub fn blip(number: u16, blip_index: i32) -> Self {
        Self::Simple {
            id: PropertyId::new(number, PropertyFlags::BLIP_ID),
            value: blip_index,
        }
    }

    pub fn complex(number: u16, data: Vec<u8>) -> Self {
        Self::Complex {
            id: PropertyId::new(number, PropertyFlags::COMPLEX),
            data,
        }
    }

    /// Complex property holding a NUL-terminated UTF-16LE string.
    pub fn unicode(number: u16, text: &str) -> Self {
        let mut data: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        data.extend_from_slice(&[0, 0]);
        Self::complex(number, data)
    }

    #[inline]
    pub fn id(&self) -> PropertyId {
        match self {
            Self::Simple { id, .. } | Self::Complex { id, .. } => *id,
            Self::Array(array) => array.id,
        }
    }

    #[inline]
    pub fn number(&self) -> u16 {
        self.id().number()
    }

    /// Symbolic name of the property number, if known.
    pub fn name(&self) -> Option<&'static str> {
        property_name(self.number())
    }

    /// Inline value of a simple property.
    pub fn value(&self) -> Option<i32> {
        match self {
            Self::Simple { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Trailing payload of a complex or array property.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Simple { .. } => None,
            Self::Complex { data, .. } => Some(data),
            Self::Array(array) => Some(&array.data),
        }
    }

    pub fn as_array(&self) -> Option<&ArrayProperty> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Bytes this property adds to the second phase.
    #[inline]
    pub fn complex_len(&self) -> usize {
        self.data().map_or(0, <[u8]>::len)
    }

    /// Total serialized size: entry plus trailing payload.
    #[inline]
    pub fn serialized_size(&self) -> usize {
        PROPERTY_ENTRY_SIZE + self.complex_len()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_u16(self.id().raw())?;
        match self {
            Self::Simple { value, .. } => writer.put_i32(*value),
            Self::Complex { data, .. } => writer.put_u32(data.len() as u32),
            Self::Array(array) => writer.put_u32(array.declared_len() as u32),
        }
    }
}

impl fmt::Display for EscherProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id();
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:04X})", id.raw())?,
            None => write!(f, "unknown (0x{:04X})", id.raw())?,
        }
        match self {
            Self::Simple { value, .. } if id.is_blip_id() => write!(f, " = blip #{value}"),
            Self::Simple { value, .. } => write!(f, " = {value} (0x{:08X})", *value as u32),
            Self::Complex { data, .. } => write!(f, " = {} bytes", data.len()),
            Self::Array(array) => write!(
                f,
                " = {} elements x {} bytes",
                array.element_count(),
                array.element_size()
            ),
        }
    }
}

/// Total size of a property table: `6 * count + sum(payload lengths)`.
pub fn properties_size(properties: &[EscherProperty]) -> usize {
    properties.iter().map(EscherProperty::serialized_size).sum()
}

/// Decode `count` properties from `body`.
///
/// `body` is exactly the record body; `base` is its absolute offset, used
/// for error reporting. Returns the properties and the bytes consumed.
pub fn decode_properties(
    body: &[u8],
    base: usize,
    count: usize,
    record_id: u16,
    ctx: &DecodeContext<'_>,
) -> Result<(Vec<EscherProperty>, usize)> {
    let table_size = count * PROPERTY_ENTRY_SIZE;
    if table_size > body.len() {
        return Err(DecodeError::malformed(
            record_id,
            base,
            format!(
                "{count} property entries need {table_size} bytes, body holds {}",
                body.len()
            ),
        ));
    }

    // Phase one: fixed-size entries
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let offset = i * PROPERTY_ENTRY_SIZE;
        let id = PropertyId::from_raw(read_u16_le(body, offset)?);
        let value = read_u32_le(body, offset + 2)?;
        entries.push((id, value));
    }

    // Phase two: complex payloads in table order
    let limit = ctx.limits().max_property_payload;
    let mut pos = table_size;
    let mut properties = Vec::with_capacity(count);
    for (id, value) in entries {
        if !id.is_complex() {
            properties.push(EscherProperty::Simple {
                id,
                value: value as i32,
            });
            continue;
        }

        let declared = value as usize;
        DecodeLimits::check("complex property payload", declared, limit)?;

        let mut len = declared;
        let mut size_includes_header = true;
        let array = is_array_property(id.number())
            && (declared == 0 || body.len().saturating_sub(pos) >= ARRAY_HEADER_SIZE);
        if array && declared != 0 {
            let elements = read_u16_le(body, pos)? as usize;
            let element_size = element_size_from_raw(read_i16_le(body, pos + 4)?);
            if elements * element_size == declared {
                // Entry length excludes the array header
                len = declared + ARRAY_HEADER_SIZE;
                size_includes_header = false;
            }
        }

        let data = body.get(pos..pos + len).ok_or_else(|| {
            DecodeError::malformed(
                record_id,
                base + pos,
                format!(
                    "property 0x{:04X} payload of {len} bytes overruns the record body",
                    id.raw()
                ),
            )
        })?;
        pos += len;

        properties.push(if array {
            EscherProperty::Array(ArrayProperty::from_raw(
                id,
                data.to_vec(),
                size_includes_header,
            ))
        } else {
            EscherProperty::Complex {
                id,
                data: data.to_vec(),
            }
        });
    }

    Ok((properties, pos))
}

/// Write a property table in its two-phase layout.
pub(crate) fn write_properties(
    properties: &[EscherProperty],
    writer: &mut ByteWriter<'_>,
) -> EncodeResult<()> {
    writer.reserve(properties_size(properties))?;
    for property in properties {
        property.write_entry(writer)?;
    }
    for property in properties {
        if let Some(data) = property.data() {
            writer.put_bytes(data)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::limits::DecodeLimits;

    fn ctx() -> DecodeContext<'static> {
        DecodeContext::with_limits(DecodeLimits::DEFAULT)
    }

    fn encode(properties: &[EscherProperty]) -> Vec<u8> {
        let mut buf = vec![0u8; properties_size(properties)];
        let mut writer = ByteWriter::new(&mut buf, 0);
        write_properties(properties, &mut writer).unwrap();
        buf
    }

    #[test]
    fn test_property_id_parts() {
        let id = PropertyId::from_raw(0xC186);
        assert_eq!(id.number(), 0x0186);
        assert!(id.is_complex());
        assert!(id.is_blip_id());
        assert_eq!(id.flags(), PropertyFlags::COMPLEX | PropertyFlags::BLIP_ID);
    }

    #[test]
    fn test_two_phase_layout() {
        let properties = vec![
            EscherProperty::complex(0x0380, vec![0xA1, 0xA2]),
            EscherProperty::simple(0x0181, 0x00FF_0000),
            EscherProperty::complex(0x0381, vec![0xB1, 0xB2, 0xB3]),
        ];
        let bytes = encode(&properties);

        assert_eq!(bytes.len(), 3 * 6 + 5);
        // Entries first
        assert_eq!(&bytes[0..6], &[0x80, 0x83, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[6..12], &[0x81, 0x01, 0x00, 0x00, 0xFF, 0x00]);
        assert_eq!(&bytes[12..18], &[0x81, 0x83, 0x03, 0x00, 0x00, 0x00]);
        // Then payloads, in table order
        assert_eq!(&bytes[18..], &[0xA1, 0xA2, 0xB1, 0xB2, 0xB3]);

        let (decoded, consumed) = decode_properties(&bytes, 0, 3, 0xF00B, &ctx()).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, properties);
    }

    #[test]
    fn test_array_property_header_excluded_from_length() {
        // Two 4-byte elements, entry length 8 (header not counted)
        let mut bytes = vec![0x45, 0x81, 0x08, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0x02, 0x00, 0x02, 0x00, 0x04, 0x00]);
        bytes.extend_from_slice(&[1, 0, 2, 0, 3, 0, 4, 0]);

        let (decoded, consumed) = decode_properties(&bytes, 0, 1, 0xF00B, &ctx()).unwrap();
        assert_eq!(consumed, bytes.len());
        let array = decoded[0].as_array().unwrap();
        assert!(!array.size_includes_header());
        assert_eq!(array.element_count(), 2);
        assert_eq!(array.element(1), Some(&[3u8, 0, 4, 0][..]));
        assert_eq!(array.element(2), None);

        assert_eq!(encode(&decoded), bytes);
    }

    #[test]
    fn test_array_property_header_included() {
        let mut array = ArrayProperty::new(0x0146, 2);
        assert!(array.push_element(&[0x00, 0x40]));
        assert!(array.push_element(&[0x01, 0xAC]));
        assert!(!array.push_element(&[0x01]));
        let properties = vec![EscherProperty::Array(array)];

        let bytes = encode(&properties);
        assert_eq!(&bytes[2..6], &10u32.to_le_bytes());
        let (decoded, _) = decode_properties(&bytes, 0, 1, 0xF00B, &ctx()).unwrap();
        assert_eq!(decoded, properties);
        assert_eq!(decoded[0].as_array().unwrap().elements().count(), 2);
    }

    #[test]
    fn test_negative_element_size() {
        let mut array = ArrayProperty::new(0x0145, 0xFFF0);
        assert_eq!(array.raw_element_size(), -16);
        assert_eq!(array.element_size(), 4);
        assert!(array.push_element(&[1, 2, 3, 4]));
        assert_eq!(array.elements().next(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_table_larger_than_body() {
        let bytes = [0x81, 0x01, 0x00, 0x00, 0x00, 0x00];
        let err = decode_properties(&bytes, 8, 2, 0xF00B, &ctx()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { offset: 8, .. }));
    }

    #[test]
    fn test_complex_payload_overrun() {
        let bytes = [0x80, 0x83, 0x10, 0x00, 0x00, 0x00, 0x41];
        let err = decode_properties(&bytes, 0, 1, 0xF00B, &ctx()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { .. }));
    }

    #[test]
    fn test_complex_payload_over_limit() {
        let bytes = [0x80, 0x83, 0xFF, 0xFF, 0xFF, 0x7F];
        let ctx = DecodeContext::with_limits(DecodeLimits::uniform(1024));
        let err = decode_properties(&bytes, 0, 1, 0xF00B, &ctx).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OversizeAllocation {
                what: "complex property payload",
                requested: 0x7FFF_FFFF,
                limit: 1024
            }
        );
    }

    #[test]
    fn test_unicode_property() {
        let property = EscherProperty::unicode(0x0380, "Hi");
        assert_eq!(property.data(), Some(&[b'H', 0, b'i', 0, 0, 0][..]));
        assert_eq!(property.name(), Some("groupshape.shapename"));
        assert_eq!(property.serialized_size(), 12);
    }

    #[test]
    fn test_display() {
        let property = EscherProperty::simple(0x0181, 0x0800_0004);
        assert_eq!(
            property.to_string(),
            "fill.fillcolor (0x0181) = 134217732 (0x08000004)"
        );
        let blip = EscherProperty::blip(0x0104, 3);
        assert_eq!(blip.to_string(), "blip.bliptodisplay (0x4104) = blip #3");
    }
}
