//! Shape option records (Opt, SecondaryOpt, TertiaryOpt).
//!
//! The body is a property table; the header instance holds the number of
//! properties. See [`super::properties`] for the table layout.

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::properties::{EscherProperty, decode_properties, properties_size, write_properties};
use super::record::{Record, full_body};
use super::types::EscherRecordType;
use crate::common::binary::ByteWriter;
use crate::common::error::{DecodeWarning, EncodeResult, Result};
use tracing::warn;

/// Version written by Office for option records.
pub const OPT_VERSION: u8 = 0x03;

/// Most properties a table can hold; the count lives in the 12-bit instance.
pub const MAX_PROPERTIES: usize = 0x0FFF;

/// Shape property table record.
#[derive(Debug, Clone, PartialEq)]
pub struct OptRecord {
    record_id: u16,
    version: u8,
    properties: Vec<EscherProperty>,
    /// Declared body bytes past the end of the table
    trailing: Vec<u8>,
}

impl Default for OptRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl OptRecord {
    /// Empty primary option table (0xF00B).
    pub fn new() -> Self {
        Self::with_record_id(EscherRecordType::Opt as u16)
    }

    /// Empty option table with another record id (0xF121, 0xF122).
    pub fn with_record_id(record_id: u16) -> Self {
        Self {
            record_id,
            version: OPT_VERSION,
            properties: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = full_body(data, offset, header)?;
        let body_start = offset + HEADER_SIZE;
        let (properties, used) = decode_properties(
            body,
            body_start,
            header.instance as usize,
            header.record_id,
            ctx,
        )?;

        let trailing = body[used..].to_vec();
        if !trailing.is_empty() {
            warn!(
                record_id = header.record_id,
                offset = body_start + used,
                len = trailing.len(),
                "Option record has bytes after its property table"
            );
            ctx.warn(DecodeWarning::UnparsedBytes {
                record_id: header.record_id,
                offset: body_start + used,
                len: trailing.len(),
            });
        }

        Ok((
            Self {
                record_id: header.record_id,
                version: header.version,
                properties,
                trailing,
            },
            HEADER_SIZE + body.len(),
        ))
    }

    /// Properties in table order.
    #[inline]
    pub fn properties(&self) -> &[EscherProperty] {
        &self.properties
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property with the given number (flags ignored).
    pub fn lookup(&self, number: u16) -> Option<&EscherProperty> {
        let number = number & 0x3FFF;
        self.properties.iter().find(|p| p.number() == number)
    }

    /// Add or replace a property, keeping the table sorted by raw id.
    ///
    /// Returns `false` (leaving the table unchanged) when a new property
    /// would push the table past [`MAX_PROPERTIES`].
    pub fn set(&mut self, property: EscherProperty) -> bool {
        let number = property.number();
        let replaces = self.properties.iter().any(|p| p.number() == number);
        if !replaces && self.properties.len() >= MAX_PROPERTIES {
            return false;
        }
        self.properties.retain(|p| p.number() != number);
        self.properties.push(property);
        self.sort();
        true
    }

    /// Remove the property with the given number.
    pub fn remove(&mut self, number: u16) -> Option<EscherProperty> {
        let number = number & 0x3FFF;
        let index = self.properties.iter().position(|p| p.number() == number)?;
        Some(self.properties.remove(index))
    }

    /// Sort the table ascending by raw id.
    pub fn sort(&mut self) {
        self.properties.sort_by_key(|p| p.id().raw());
    }

    /// Bytes kept from past the end of the property table.
    #[inline]
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.trailing
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version & 0x0F;
    }
}

impl Record for OptRecord {
    #[inline]
    fn record_id(&self) -> u16 {
        self.record_id
    }

    #[inline]
    fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    fn instance(&self) -> u16 {
        self.properties.len() as u16
    }

    fn body_size(&self) -> usize {
        properties_size(&self.properties) + self.trailing.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        write_properties(&self.properties, writer)?;
        writer.put_bytes(&self.trailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::DecodeError;
    use crate::escher::limits::DecodeLimits;
    use crate::escher::record::EscherRecord;
    use crate::escher::{decode, decode_with};

    fn sample() -> OptRecord {
        let mut opt = OptRecord::new();
        opt.set(EscherProperty::simple(0x0181, 0x0800_0004));
        opt.set(EscherProperty::blip(0x0104, 1));
        opt.set(EscherProperty::unicode(0x0380, "Box"));
        opt
    }

    #[test]
    fn test_set_keeps_order() {
        let opt = sample();
        let ids: Vec<u16> = opt.properties().iter().map(|p| p.id().raw()).collect();
        assert_eq!(ids, vec![0x0181, 0x4104, 0x8380]);
        assert_eq!(opt.instance(), 3);
    }

    #[test]
    fn test_set_replaces_by_number() {
        let mut opt = sample();
        opt.set(EscherProperty::simple(0x0181, 7));
        assert_eq!(opt.len(), 3);
        assert_eq!(opt.lookup(0x0181).and_then(EscherProperty::value), Some(7));
    }

    #[test]
    fn test_set_respects_instance_width() {
        let mut opt = OptRecord::new();
        for number in 0..MAX_PROPERTIES as u16 {
            assert!(opt.set(EscherProperty::simple(number, 0)));
        }
        assert!(!opt.set(EscherProperty::simple(0x3000, 1)));
        assert_eq!(opt.len(), MAX_PROPERTIES);
        assert!(opt.lookup(0x3000).is_none());

        // Replacing an existing number still works at capacity
        assert!(opt.set(EscherProperty::simple(5, 9)));
        assert_eq!(opt.lookup(5).and_then(EscherProperty::value), Some(9));
        assert_eq!(opt.header().instance, MAX_PROPERTIES as u16);
    }

    #[test]
    fn test_remove_and_lookup() {
        let mut opt = sample();
        assert!(opt.lookup(0x0104).unwrap().id().is_blip_id());
        let removed = opt.remove(0x0104).unwrap();
        assert_eq!(removed.value(), Some(1));
        assert!(opt.lookup(0x0104).is_none());
        assert!(opt.remove(0x0104).is_none());
        assert_eq!(opt.instance(), 2);
    }

    #[test]
    fn test_round_trip() {
        let opt = sample();
        let bytes = opt.to_bytes();
        assert_eq!(bytes.len(), opt.record_size());
        // version 3, instance 3
        assert_eq!(&bytes[0..4], &[0x33, 0x00, 0x0B, 0xF0]);
        assert_eq!(opt.body_size(), 3 * 6 + 8);

        let (decoded, consumed) = decode(&bytes, 0).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, EscherRecord::Opt(opt));
    }

    #[test]
    fn test_decode_preserves_disk_order() {
        // Two simple properties stored out of order
        let mut bytes = vec![0x23, 0x00, 0x0B, 0xF0, 0x0C, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0xBF, 0x01, 0x10, 0x00, 0x10, 0x00]);
        bytes.extend_from_slice(&[0x81, 0x01, 0x04, 0x00, 0x00, 0x08]);

        let (record, _) = decode(&bytes, 0).unwrap();
        let opt = record.as_opt().unwrap();
        assert_eq!(opt.properties()[0].number(), 0x01BF);
        assert_eq!(opt.properties()[1].number(), 0x0181);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_trailing_bytes_kept() {
        let mut bytes = vec![0x13, 0x00, 0x0B, 0xF0, 0x08, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0x81, 0x01, 0x04, 0x00, 0x00, 0x08]);
        bytes.extend_from_slice(&[0xEE, 0xFF]);

        let mut ctx = DecodeContext::with_limits(DecodeLimits::DEFAULT);
        let (record, consumed) = decode_with(&bytes, 0, &mut ctx).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(record.as_opt().unwrap().trailing_bytes(), &[0xEE, 0xFF]);
        assert_eq!(
            ctx.warnings(),
            &[DecodeWarning::UnparsedBytes {
                record_id: 0xF00B,
                offset: 14,
                len: 2
            }]
        );
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_secondary_opt() {
        let mut opt = OptRecord::with_record_id(0xF122);
        opt.set(EscherProperty::simple(0x03BF, 0x0001_0001));
        let bytes = opt.to_bytes();
        let (decoded, _) = decode(&bytes, 0).unwrap();
        assert_eq!(decoded.record_name(), "TertiaryOpt");
        assert_eq!(decoded.as_opt(), Some(&opt));
    }

    #[test]
    fn test_truncated_body() {
        let bytes = [0x13, 0x00, 0x0B, 0xF0, 0x06, 0x00, 0x00, 0x00, 0x81, 0x01];
        let err = decode(&bytes, 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                offset: 8,
                needed: 6,
                available: 2
            }
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Edit {
        Set(u16, i32),
        SetComplex(u16, Vec<u8>),
        Remove(u16),
    }

    fn edit_strategy() -> impl Strategy<Value = Edit> {
        let number = 0u16..0x0400;
        prop_oneof![
            (number.clone(), any::<i32>()).prop_map(|(n, v)| Edit::Set(n, v)),
            (number.clone(), prop::collection::vec(any::<u8>(), 0..16))
                .prop_map(|(n, d)| Edit::SetComplex(n, d)),
            number.prop_map(Edit::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_mutations_keep_ids_ascending(edits in prop::collection::vec(edit_strategy(), 0..40)) {
            let mut opt = OptRecord::new();
            for edit in edits {
                match edit {
                    Edit::Set(n, v) => {
                        opt.set(EscherProperty::simple(n, v));
                    },
                    Edit::SetComplex(n, d) => {
                        opt.set(EscherProperty::complex(n, d));
                    },
                    Edit::Remove(n) => {
                        opt.remove(n);
                    },
                }
            }

            let ids: Vec<u16> = opt.properties().iter().map(|p| p.id().raw()).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(opt.instance() as usize, opt.len());
        }
    }
}
