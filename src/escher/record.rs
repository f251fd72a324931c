//! Escher record tree.
//!
//! A decoded drawing is a tree of owned [`EscherRecord`] values. Each node
//! keeps the version, instance and record id of its header; the body length
//! is always derived from the node's content, so edits can never leave a
//! stale length behind.
//!
//! # Dispatch
//!
//! Known record kinds are enum variants (no trait objects). The [`Record`]
//! trait is the shared surface every kind implements; [`EscherRecord`]
//! forwards it to the active variant.

use super::blip::{BitmapBlipRecord, MetafileBlipRecord};
use super::bse::BseRecord;
use super::container::ContainerRecord;
use super::drawing::{DgRecord, DggRecord};
use super::header::{HEADER_SIZE, RecordHeader};
use super::opt::OptRecord;
use super::shape::{
    ChildAnchorRecord, ClientAnchorRecord, SpRecord, SpgrRecord, SplitMenuColorsRecord,
};
use super::textbox::TextboxRecord;
use super::types::{EscherRecordType, record_name};
use super::unknown::UnknownRecord;
use crate::common::binary::ByteWriter;
use crate::common::error::{DecodeError, EncodeResult, Result};
use std::borrow::Cow;

/// Behaviour shared by every record kind.
pub trait Record {
    /// Raw record type id.
    fn record_id(&self) -> u16;

    /// Version nibble of the header.
    fn version(&self) -> u8;

    /// Instance field of the header.
    fn instance(&self) -> u16;

    /// Serialized size of the body (excluding the 8-byte header).
    fn body_size(&self) -> usize;

    /// Write the body; the header has already been written.
    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()>;

    /// Header as it will be encoded.
    fn header(&self) -> RecordHeader {
        RecordHeader::new(
            self.version(),
            self.instance(),
            self.record_id(),
            self.body_size() as u32,
        )
    }

    /// Total serialized size, header included.
    #[inline]
    fn record_size(&self) -> usize {
        HEADER_SIZE + self.body_size()
    }

    /// Encode header and body at `offset`; returns the bytes written.
    ///
    /// `buf` must hold at least `offset + record_size()` bytes.
    fn encode(&self, buf: &mut [u8], offset: usize) -> EncodeResult<usize> {
        let size = self.record_size();
        let mut writer = ByteWriter::new(buf, offset);
        writer.reserve(size)?;
        self.header().write(&mut writer)?;
        self.write_body(&mut writer)?;
        debug_assert_eq!(writer.position() - offset, size);
        Ok(size)
    }

    /// Serialize into a freshly allocated buffer of exactly `record_size()` bytes.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.record_size()];
        self.encode(&mut buf, 0)
            .expect("Buffer sized from record_size() holds the encoded record");
        buf
    }
}

/// A decoded (or authored) Escher record.
#[derive(Debug, Clone, PartialEq)]
pub enum EscherRecord {
    Container(ContainerRecord),
    Opt(OptRecord),
    Dg(DgRecord),
    Dgg(DggRecord),
    Sp(SpRecord),
    Spgr(SpgrRecord),
    ChildAnchor(ChildAnchorRecord),
    ClientAnchor(ClientAnchorRecord),
    SplitMenuColors(SplitMenuColorsRecord),
    Textbox(TextboxRecord),
    Bse(BseRecord),
    MetafileBlip(MetafileBlipRecord),
    BitmapBlip(BitmapBlipRecord),
    Unknown(UnknownRecord),
}

macro_rules! dispatch {
    ($self:expr, $rec:ident => $body:expr) => {
        match $self {
            EscherRecord::Container($rec) => $body,
            EscherRecord::Opt($rec) => $body,
            EscherRecord::Dg($rec) => $body,
            EscherRecord::Dgg($rec) => $body,
            EscherRecord::Sp($rec) => $body,
            EscherRecord::Spgr($rec) => $body,
            EscherRecord::ChildAnchor($rec) => $body,
            EscherRecord::ClientAnchor($rec) => $body,
            EscherRecord::SplitMenuColors($rec) => $body,
            EscherRecord::Textbox($rec) => $body,
            EscherRecord::Bse($rec) => $body,
            EscherRecord::MetafileBlip($rec) => $body,
            EscherRecord::BitmapBlip($rec) => $body,
            EscherRecord::Unknown($rec) => $body,
        }
    };
}

impl Record for EscherRecord {
    #[inline]
    fn record_id(&self) -> u16 {
        dispatch!(self, r => r.record_id())
    }

    #[inline]
    fn version(&self) -> u8 {
        dispatch!(self, r => r.version())
    }

    #[inline]
    fn instance(&self) -> u16 {
        dispatch!(self, r => r.instance())
    }

    #[inline]
    fn body_size(&self) -> usize {
        dispatch!(self, r => r.body_size())
    }

    #[inline]
    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        dispatch!(self, r => r.write_body(writer))
    }
}

impl EscherRecord {
    /// Typed record kind of the raw id.
    #[inline]
    pub fn record_type(&self) -> EscherRecordType {
        EscherRecordType::from(self.record_id())
    }

    /// Display name of the record type.
    pub fn record_name(&self) -> Cow<'static, str> {
        record_name(self.record_id())
    }

    /// Whether this node holds child records.
    pub fn is_container(&self) -> bool {
        match self {
            Self::Container(_) => true,
            Self::Unknown(unknown) => unknown.is_container(),
            _ => false,
        }
    }

    /// Child records; empty for leaf records.
    pub fn children(&self) -> &[EscherRecord] {
        match self {
            Self::Container(container) => container.children(),
            Self::Unknown(unknown) => unknown.children(),
            _ => &[],
        }
    }

    /// Mutable child list of a container node.
    pub fn children_mut(&mut self) -> Option<&mut Vec<EscherRecord>> {
        match self {
            Self::Container(container) => Some(container.children_mut()),
            Self::Unknown(unknown) => unknown.children_mut(),
            _ => None,
        }
    }

    /// First direct child with the given record id.
    pub fn find_child(&self, record_id: u16) -> Option<&EscherRecord> {
        self.children().iter().find(|c| c.record_id() == record_id)
    }

    /// All descendants with the given record id, depth-first.
    ///
    /// BLIPs embedded in BSE records count as descendants.
    pub fn find_all(&self, record_id: u16) -> Vec<&EscherRecord> {
        let mut found = Vec::new();
        self.collect(record_id, &mut found);
        found
    }

    fn collect<'a>(&'a self, record_id: u16, found: &mut Vec<&'a EscherRecord>) {
        let embedded = match self {
            Self::Bse(bse) => bse.blip(),
            _ => None,
        };
        for child in self.children().iter().chain(embedded) {
            if child.record_id() == record_id {
                found.push(child);
            }
            child.collect(record_id, found);
        }
    }

    pub fn as_container(&self) -> Option<&ContainerRecord> {
        match self {
            Self::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn as_opt(&self) -> Option<&OptRecord> {
        match self {
            Self::Opt(opt) => Some(opt),
            _ => None,
        }
    }

    pub fn as_opt_mut(&mut self) -> Option<&mut OptRecord> {
        match self {
            Self::Opt(opt) => Some(opt),
            _ => None,
        }
    }
}

macro_rules! impl_from_record {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for EscherRecord {
                #[inline]
                fn from(record: $ty) -> Self {
                    Self::$variant(record)
                }
            }
        )*
    };
}

impl_from_record!(
    Container(ContainerRecord),
    Opt(OptRecord),
    Dg(DgRecord),
    Dgg(DggRecord),
    Sp(SpRecord),
    Spgr(SpgrRecord),
    ChildAnchor(ChildAnchorRecord),
    ClientAnchor(ClientAnchorRecord),
    SplitMenuColors(SplitMenuColorsRecord),
    Textbox(TextboxRecord),
    Bse(BseRecord),
    MetafileBlip(MetafileBlipRecord),
    BitmapBlip(BitmapBlipRecord),
    Unknown(UnknownRecord),
);

/// Borrow the full declared body of a record whose header sits at `offset`.
///
/// Fails with `TruncatedInput` if the buffer ends early.
pub(crate) fn full_body<'d>(data: &'d [u8], offset: usize, header: &RecordHeader) -> Result<&'d [u8]> {
    let start = offset + HEADER_SIZE;
    let len = header.length as usize;
    data.get(start..)
        .and_then(|rest| rest.get(..len))
        .ok_or_else(|| DecodeError::truncated(start, len, data.len().saturating_sub(start)))
}

/// Borrow a fixed-size body, enforcing one of the accepted declared lengths.
///
/// A declared length outside `accepted` is `MalformedRecord`; an accepted
/// length the buffer cannot supply is `TruncatedInput`.
pub(crate) fn fixed_body<'d>(
    data: &'d [u8],
    offset: usize,
    header: &RecordHeader,
    accepted: &[usize],
) -> Result<&'d [u8]> {
    if !accepted.contains(&(header.length as usize)) {
        return Err(DecodeError::malformed(
            header.record_id,
            offset,
            format!(
                "{} body length {} not in {:?}",
                record_name(header.record_id),
                header.length,
                accepted
            ),
        ));
    }
    full_body(data, offset, header)
}

/// Borrow the declared body clamped to the buffer.
///
/// Returns the available slice and whether it was cut short.
pub(crate) fn clamped_body<'d>(data: &'d [u8], offset: usize, header: &RecordHeader) -> (&'d [u8], bool) {
    let start = (offset + HEADER_SIZE).min(data.len());
    let end = start.saturating_add(header.length as usize).min(data.len());
    let body = &data[start..end];
    (body, body.len() < header.length as usize)
}
