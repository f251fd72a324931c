//! Container record handling.
//!
//! A container's body is a run of child records. Decoding hands each child
//! back to the record factory, so nesting is arbitrary; encoding writes the
//! children in order after a header whose length is recomputed from them.
//!
//! # Truncated containers
//!
//! Documents in the wild often declare more container bytes than they hold.
//! When the declared budget outlives the buffer (or what is left of the
//! budget is too small for a record header), the bytes that are present are
//! kept verbatim and the shortfall is recorded as `remaining_length`. Both
//! are re-emitted on encode (the shortfall as zero padding), so the
//! re-encoded record has exactly the declared length.

use super::context::DecodeContext;
use super::header::{CONTAINER_VERSION, HEADER_SIZE, RecordHeader};
use super::record::{EscherRecord, Record};
use crate::common::binary::ByteWriter;
use crate::common::error::{DecodeWarning, EncodeResult, Result};
use tracing::warn;

/// Ordered child records plus whatever part of the declared body could not
/// be decoded into whole records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildList {
    records: Vec<EscherRecord>,
    trailing: Vec<u8>,
    remaining_length: u32,
}

impl ChildList {
    pub fn new(records: Vec<EscherRecord>) -> Self {
        Self {
            records,
            trailing: Vec::new(),
            remaining_length: 0,
        }
    }

    /// Decode children from the body of the record whose header is `header`
    /// at `offset`. Returns the list and the body bytes consumed.
    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        ctx.enter()?;
        let result = Self::decode_children(data, offset, header, ctx);
        ctx.leave();
        result
    }

    fn decode_children(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let factory = ctx.factory();
        let body_start = offset + HEADER_SIZE;
        let mut remaining = header.length as usize;
        let mut pos = body_start;
        let mut list = Self::default();

        while remaining > 0 {
            let available = data.len().saturating_sub(pos);
            if remaining < HEADER_SIZE || available < HEADER_SIZE {
                let keep = remaining.min(available);
                list.trailing = data[pos..pos + keep].to_vec();
                pos += keep;
                remaining -= keep;

                if remaining > 0 {
                    list.remaining_length = remaining as u32;
                    warn!(
                        record_id = header.record_id,
                        offset,
                        remaining,
                        "Not enough Escher data: container declares more bytes than the buffer holds"
                    );
                    ctx.warn(DecodeWarning::TruncatedContainer {
                        record_id: header.record_id,
                        offset,
                        remaining_length: list.remaining_length,
                    });
                } else {
                    warn!(
                        record_id = header.record_id,
                        offset = pos - keep,
                        len = keep,
                        "Container slack too short for a record header"
                    );
                    ctx.warn(DecodeWarning::UnparsedBytes {
                        record_id: header.record_id,
                        offset: pos - keep,
                        len: keep,
                    });
                }
                break;
            }

            let (child_header, _) = RecordHeader::decode(data, pos)?;
            let declared = HEADER_SIZE + child_header.length as usize;
            let (child, consumed) = factory.create_record(data, pos, ctx)?;
            // A child cut short by the buffer end is charged what it will
            // re-emit; the parent pads any shortfall the child dropped.
            let charged = if consumed < declared {
                child.record_size().max(consumed)
            } else {
                consumed
            };
            remaining = remaining.saturating_sub(charged);
            pos += consumed;
            list.records.push(child);
        }

        Ok((list, pos - body_start))
    }

    #[inline]
    pub fn records(&self) -> &[EscherRecord] {
        &self.records
    }

    #[inline]
    pub fn records_mut(&mut self) -> &mut Vec<EscherRecord> {
        &mut self.records
    }

    /// Declared bytes that were never present in the buffer.
    #[inline]
    pub fn remaining_length(&self) -> u32 {
        self.remaining_length
    }

    /// Bytes present in the body but too short to form a record.
    #[inline]
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }

    pub fn body_size(&self) -> usize {
        self.records.iter().map(Record::record_size).sum::<usize>()
            + self.trailing.len()
            + self.remaining_length as usize
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        for record in &self.records {
            record.header().write(writer)?;
            record.write_body(writer)?;
        }
        writer.put_bytes(&self.trailing)?;
        writer.put_zeros(self.remaining_length as usize)
    }
}

/// Container record (version 0xF) with owned children.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    record_id: u16,
    instance: u16,
    children: ChildList,
}

impl ContainerRecord {
    /// Empty container of the given type.
    pub fn new(record_id: u16) -> Self {
        Self {
            record_id,
            instance: 0,
            children: ChildList::default(),
        }
    }

    pub fn with_children(record_id: u16, children: Vec<EscherRecord>) -> Self {
        Self {
            record_id,
            instance: 0,
            children: ChildList::new(children),
        }
    }

    /// Decode a container whose header is at `offset`.
    ///
    /// Returns the record and the bytes consumed (header included).
    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let (children, consumed) = ChildList::decode(data, offset, header, ctx)?;
        Ok((
            Self {
                record_id: header.record_id,
                instance: header.instance,
                children,
            },
            HEADER_SIZE + consumed,
        ))
    }

    pub fn set_instance(&mut self, instance: u16) {
        self.instance = instance & 0x0FFF;
    }

    #[inline]
    pub fn children(&self) -> &[EscherRecord] {
        self.children.records()
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<EscherRecord> {
        self.children.records_mut()
    }

    pub fn set_children(&mut self, children: Vec<EscherRecord>) {
        *self.children.records_mut() = children;
    }

    pub fn add_child(&mut self, child: EscherRecord) {
        self.children.records_mut().push(child);
    }

    /// Insert a child at `index` (clamped to the end of the list).
    pub fn insert_child(&mut self, index: usize, child: EscherRecord) {
        let records = self.children.records_mut();
        let index = index.min(records.len());
        records.insert(index, child);
    }

    pub fn remove_child(&mut self, index: usize) -> Option<EscherRecord> {
        let records = self.children.records_mut();
        (index < records.len()).then(|| records.remove(index))
    }

    /// Remove every direct child with the given record id.
    pub fn remove_children_by_id(&mut self, record_id: u16) -> usize {
        let records = self.children.records_mut();
        let before = records.len();
        records.retain(|r| r.record_id() != record_id);
        before - records.len()
    }

    /// First direct child with the given record id.
    pub fn find_child(&self, record_id: u16) -> Option<&EscherRecord> {
        self.children().iter().find(|c| c.record_id() == record_id)
    }

    pub fn find_child_mut(&mut self, record_id: u16) -> Option<&mut EscherRecord> {
        self.children_mut()
            .iter_mut()
            .find(|c| c.record_id() == record_id)
    }

    /// Declared bytes missing from a truncated source (0 when well-formed).
    #[inline]
    pub fn remaining_length(&self) -> u32 {
        self.children.remaining_length()
    }

    /// Body bytes that could not form a whole child record.
    #[inline]
    pub fn trailing_bytes(&self) -> &[u8] {
        self.children.trailing()
    }

    #[inline]
    pub fn child_list(&self) -> &ChildList {
        &self.children
    }
}

impl Record for ContainerRecord {
    #[inline]
    fn record_id(&self) -> u16 {
        self.record_id
    }

    #[inline]
    fn version(&self) -> u8 {
        CONTAINER_VERSION
    }

    #[inline]
    fn instance(&self) -> u16 {
        self.instance
    }

    #[inline]
    fn body_size(&self) -> usize {
        self.children.body_size()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        self.children.write(writer)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::escher::limits::DecodeLimits;
    use crate::escher::shape::Rect;
    use crate::escher::{DgRecord, decode_with};
    use proptest::prelude::*;

    fn small_anchor(rect: [i16; 4]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x0F, 0xF0, 0x08, 0x00, 0x00, 0x00];
        for v in rect {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_small_anchors_consume_declared_bytes(
            layout in prop::collection::vec((any::<bool>(), any::<[i16; 4]>()), 1..8),
        ) {
            let mut body = Vec::new();
            for (is_anchor, rect) in &layout {
                if *is_anchor {
                    body.extend(small_anchor(*rect));
                } else {
                    body.extend(DgRecord::new(1, rect[0] as u16 as u32, 0).to_bytes());
                }
            }
            let mut data = vec![0x0F, 0x00, 0x04, 0xF0];
            data.extend_from_slice(&(body.len() as u32).to_le_bytes());
            data.extend(&body);

            let mut ctx = DecodeContext::with_limits(DecodeLimits::DEFAULT);
            let (record, consumed) = decode_with(&data, 0, &mut ctx).unwrap();
            prop_assert_eq!(consumed, data.len());
            prop_assert!(ctx.warnings().is_empty());
            prop_assert_eq!(record.children().len(), layout.len());

            for ((is_anchor, rect), child) in layout.iter().zip(record.children()) {
                if *is_anchor {
                    let expected = Rect::new(rect[0] as i32, rect[1] as i32, rect[2] as i32, rect[3] as i32);
                    prop_assert_eq!(child, &EscherRecord::ChildAnchor(
                        crate::escher::ChildAnchorRecord::new(expected)
                    ));
                }
            }
        }
    }
}
