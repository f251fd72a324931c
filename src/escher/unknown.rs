//! Fallback for record types without a registered decoder.
//!
//! Unknown leaves keep their payload verbatim. Unknown containers are still
//! walked, so recognizable records nested inside them are decoded.

use super::container::ChildList;
use super::context::DecodeContext;
use super::header::{CONTAINER_VERSION, HEADER_SIZE, RecordHeader};
use super::limits::DecodeLimits;
use super::record::{EscherRecord, Record, clamped_body};
use crate::common::binary::ByteWriter;
use crate::common::error::{DecodeWarning, EncodeResult, Result};
use tracing::warn;

/// Body of an unrecognized record.
#[derive(Debug, Clone, PartialEq)]
pub enum UnknownContents {
    /// Opaque leaf payload
    Payload(Vec<u8>),
    /// Child records of a container-flagged header
    Children(ChildList),
}

/// Record of a type the factory does not know.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownRecord {
    record_id: u16,
    version: u8,
    instance: u16,
    contents: UnknownContents,
}

impl UnknownRecord {
    /// Opaque leaf record.
    pub fn leaf(record_id: u16, version: u8, instance: u16, payload: Vec<u8>) -> Self {
        Self {
            record_id,
            version: version & 0x0F,
            instance: instance & 0x0FFF,
            contents: UnknownContents::Payload(payload),
        }
    }

    /// Container record with the given children.
    pub fn container(record_id: u16, instance: u16, children: Vec<EscherRecord>) -> Self {
        Self {
            record_id,
            version: CONTAINER_VERSION,
            instance: instance & 0x0FFF,
            contents: UnknownContents::Children(ChildList::new(children)),
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let (contents, consumed) = if header.is_container() {
            let (children, consumed) = ChildList::decode(data, offset, header, ctx)?;
            (UnknownContents::Children(children), consumed)
        } else {
            let limit = ctx.limits().max_unknown_payload;
            let payload = opaque_payload(data, offset, header, "unknown record payload", limit, ctx)?;
            let consumed = payload.len();
            (UnknownContents::Payload(payload), consumed)
        };

        Ok((
            Self {
                record_id: header.record_id,
                version: header.version,
                instance: header.instance,
                contents,
            },
            HEADER_SIZE + consumed,
        ))
    }

    #[inline]
    pub fn contents(&self) -> &UnknownContents {
        &self.contents
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self.contents, UnknownContents::Children(_))
    }

    /// Leaf payload, if this is not a container.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.contents {
            UnknownContents::Payload(payload) => Some(payload),
            UnknownContents::Children(_) => None,
        }
    }

    pub fn children(&self) -> &[EscherRecord] {
        match &self.contents {
            UnknownContents::Children(children) => children.records(),
            UnknownContents::Payload(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<EscherRecord>> {
        match &mut self.contents {
            UnknownContents::Children(children) => Some(children.records_mut()),
            UnknownContents::Payload(_) => None,
        }
    }

    /// Declared bytes missing from a truncated container (0 for leaves).
    pub fn remaining_length(&self) -> u32 {
        match &self.contents {
            UnknownContents::Children(children) => children.remaining_length(),
            UnknownContents::Payload(_) => 0,
        }
    }
}

impl Record for UnknownRecord {
    fn record_id(&self) -> u16 {
        self.record_id
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        match &self.contents {
            UnknownContents::Payload(payload) => payload.len(),
            UnknownContents::Children(children) => children.body_size(),
        }
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        match &self.contents {
            UnknownContents::Payload(payload) => writer.put_bytes(payload),
            UnknownContents::Children(children) => children.write(writer),
        }
    }
}

/// Copy an opaque body, checking `limit` against the declared length and
/// clamping to the bytes the buffer actually holds.
pub(crate) fn opaque_payload(
    data: &[u8],
    offset: usize,
    header: &RecordHeader,
    what: &'static str,
    limit: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<Vec<u8>> {
    DecodeLimits::check(what, header.length as usize, limit)?;

    let (body, truncated) = clamped_body(data, offset, header);
    if truncated {
        warn!(
            record_id = header.record_id,
            offset,
            declared = header.length,
            available = body.len(),
            "Record payload runs past the end of the buffer, clamping"
        );
        ctx.warn(DecodeWarning::TruncatedPayload {
            record_id: header.record_id,
            offset,
            declared: header.length as usize,
            available: body.len(),
        });
    }
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::DecodeError;
    use crate::escher::drawing::DgRecord;
    use crate::escher::{decode, decode_with};

    #[test]
    fn test_unknown_leaf_lossless() {
        let bytes = [0x32, 0x01, 0x34, 0xF1, 0x05, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5];
        let (record, consumed) = decode(&bytes, 0).unwrap();
        assert_eq!(consumed, bytes.len());
        match &record {
            EscherRecord::Unknown(unknown) => {
                assert_eq!(unknown.payload(), Some(&[1u8, 2, 3, 4, 5][..]));
                assert_eq!(unknown.version(), 2);
                assert_eq!(unknown.instance(), 0x013);
            },
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(record.to_bytes(), bytes);
        assert_eq!(record.record_name(), "Unknown 0xF134");
    }

    #[test]
    fn test_unknown_container_decodes_children() {
        let dg = DgRecord::new(1, 3, 1024);
        let mut bytes = vec![0x0F, 0x00, 0x77, 0xF1, 0x10, 0x00, 0x00, 0x00];
        bytes.extend(dg.to_bytes());

        let (record, _) = decode(&bytes, 0).unwrap();
        assert!(record.is_container());
        assert_eq!(record.children(), &[EscherRecord::Dg(dg)]);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_known_container_id_with_leaf_header() {
        // DgContainer id without the container version is kept opaque
        let bytes = [0x00, 0x00, 0x02, 0xF0, 0x02, 0x00, 0x00, 0x00, 0xAB, 0xCD];
        let (record, _) = decode(&bytes, 0).unwrap();
        assert!(matches!(record, EscherRecord::Unknown(_)));
        assert!(!record.is_container());
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_unknown_leaf_clamped() {
        let bytes = [0x00, 0x00, 0x34, 0xF1, 0x10, 0x00, 0x00, 0x00, 9, 9, 9];
        let mut ctx = DecodeContext::with_limits(DecodeLimits::DEFAULT);
        let (record, consumed) = decode_with(&bytes, 0, &mut ctx).unwrap();
        assert_eq!(consumed, bytes.len());
        match &record {
            EscherRecord::Unknown(unknown) => assert_eq!(unknown.payload(), Some(&[9u8, 9, 9][..])),
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(
            ctx.warnings(),
            &[DecodeWarning::TruncatedPayload {
                record_id: 0xF134,
                offset: 0,
                declared: 16,
                available: 3
            }]
        );
    }

    #[test]
    fn test_unknown_leaf_over_limit() {
        // Declared 0x7FFFFFFF bytes; rejected before anything is copied
        let bytes = [0x00, 0x00, 0x34, 0xF1, 0xFF, 0xFF, 0xFF, 0x7F, 0, 0];
        let mut ctx = DecodeContext::with_limits(DecodeLimits::uniform(16));
        assert_eq!(
            decode_with(&bytes, 0, &mut ctx).unwrap_err(),
            DecodeError::OversizeAllocation {
                what: "unknown record payload",
                requested: 0x7FFF_FFFF,
                limit: 16
            }
        );
    }
}
