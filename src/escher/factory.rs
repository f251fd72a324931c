//! Record factory: maps a record id to its decoder.
//!
//! Containment is structural. A header with the container version is decoded
//! as a container whenever its id is registered at all, whatever kind is
//! registered for it; unregistered ids fall back to [`UnknownRecord`], which
//! still walks container bodies.

use super::blip::{BitmapBlipRecord, MetafileBlipRecord};
use super::bse::BseRecord;
use super::container::ContainerRecord;
use super::context::DecodeContext;
use super::drawing::{DgRecord, DggRecord};
use super::header::RecordHeader;
use super::opt::OptRecord;
use super::record::EscherRecord;
use super::shape::{
    ChildAnchorRecord, ClientAnchorRecord, SpRecord, SpgrRecord, SplitMenuColorsRecord,
};
use super::textbox::TextboxRecord;
use super::unknown::UnknownRecord;
use crate::common::error::Result;
use once_cell::sync::Lazy;
use phf::phf_map;
use std::collections::HashMap;
use tracing::trace;

/// Decoder selected for a record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Container,
    Opt,
    Dg,
    Dgg,
    Sp,
    Spgr,
    ChildAnchor,
    ClientAnchor,
    SplitMenuColors,
    Textbox,
    Bse,
    MetafileBlip,
    BitmapBlip,
}

/// Built-in registrations.
static BUILTIN_KINDS: phf::Map<u16, RecordKind> = phf_map! {
    0xF000u16 => RecordKind::Container, // DggContainer
    0xF001u16 => RecordKind::Container, // BStoreContainer
    0xF002u16 => RecordKind::Container, // DgContainer
    0xF003u16 => RecordKind::Container, // SpgrContainer
    0xF004u16 => RecordKind::Container, // SpContainer
    0xF005u16 => RecordKind::Container, // SolverContainer
    0xF006u16 => RecordKind::Dgg,
    0xF007u16 => RecordKind::Bse,
    0xF008u16 => RecordKind::Dg,
    0xF009u16 => RecordKind::Spgr,
    0xF00Au16 => RecordKind::Sp,
    0xF00Bu16 => RecordKind::Opt,
    0xF00Cu16 => RecordKind::Textbox,
    0xF00Du16 => RecordKind::Textbox, // ClientTextbox
    0xF00Fu16 => RecordKind::ChildAnchor,
    0xF010u16 => RecordKind::ClientAnchor,
    0xF011u16 => RecordKind::Textbox, // ClientData
    0xF01Au16 => RecordKind::MetafileBlip, // EMF
    0xF01Bu16 => RecordKind::MetafileBlip, // WMF
    0xF01Cu16 => RecordKind::MetafileBlip, // PICT
    0xF01Du16 => RecordKind::BitmapBlip, // JPEG
    0xF01Eu16 => RecordKind::BitmapBlip, // PNG
    0xF01Fu16 => RecordKind::BitmapBlip, // DIB
    0xF029u16 => RecordKind::BitmapBlip, // TIFF
    0xF02Au16 => RecordKind::BitmapBlip, // CMYK JPEG
    0xF11Eu16 => RecordKind::SplitMenuColors,
    0xF121u16 => RecordKind::Opt, // SecondaryOpt
    0xF122u16 => RecordKind::Opt, // TertiaryOpt
};

static BUILTIN: Lazy<RecordFactory> = Lazy::new(|| RecordFactory {
    kinds: BUILTIN_KINDS.entries().map(|(id, kind)| (*id, *kind)).collect(),
});

/// Registration table used to dispatch records while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFactory {
    kinds: HashMap<u16, RecordKind>,
}

impl Default for RecordFactory {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

impl RecordFactory {
    /// The shared factory with the built-in registrations.
    pub fn builtin() -> &'static RecordFactory {
        &BUILTIN
    }

    /// Factory with no registrations; every record decodes as unknown.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register (or re-register) a decoder; returns the previous kind.
    pub fn register(&mut self, record_id: u16, kind: RecordKind) -> Option<RecordKind> {
        self.kinds.insert(record_id, kind)
    }

    pub fn unregister(&mut self, record_id: u16) -> Option<RecordKind> {
        self.kinds.remove(&record_id)
    }

    #[inline]
    pub fn kind(&self, record_id: u16) -> Option<RecordKind> {
        self.kinds.get(&record_id).copied()
    }

    /// Decode the record whose header starts at `offset`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn create_record(
        &self,
        data: &[u8],
        offset: usize,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(EscherRecord, usize)> {
        let (header, is_container) = RecordHeader::decode(data, offset)?;
        let kind = self.kind(header.record_id);
        trace!(
            record_id = header.record_id,
            offset,
            length = header.length,
            container = is_container,
            ?kind,
            "Decoding escher record"
        );

        if is_container {
            return match kind {
                Some(_) => wrap(ContainerRecord::decode(data, offset, &header, ctx)),
                None => wrap(UnknownRecord::decode(data, offset, &header, ctx)),
            };
        }

        match kind {
            Some(RecordKind::Opt) => wrap(OptRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::Dg) => wrap(DgRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::Dgg) => wrap(DggRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::Sp) => wrap(SpRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::Spgr) => wrap(SpgrRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::ChildAnchor) => {
                wrap(ChildAnchorRecord::decode(data, offset, &header, ctx))
            },
            Some(RecordKind::ClientAnchor) => {
                wrap(ClientAnchorRecord::decode(data, offset, &header, ctx))
            },
            Some(RecordKind::SplitMenuColors) => {
                wrap(SplitMenuColorsRecord::decode(data, offset, &header, ctx))
            },
            Some(RecordKind::Textbox) => wrap(TextboxRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::Bse) => wrap(BseRecord::decode(data, offset, &header, ctx)),
            Some(RecordKind::MetafileBlip) => {
                wrap(MetafileBlipRecord::decode(data, offset, &header, ctx))
            },
            Some(RecordKind::BitmapBlip) => {
                wrap(BitmapBlipRecord::decode(data, offset, &header, ctx))
            },
            // Container ids without the container version carry no children
            Some(RecordKind::Container) | None => {
                wrap(UnknownRecord::decode(data, offset, &header, ctx))
            },
        }
    }
}

#[inline]
fn wrap<R: Into<EscherRecord>>(decoded: Result<(R, usize)>) -> Result<(EscherRecord, usize)> {
    decoded.map(|(record, consumed)| (record.into(), consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::DecodeError;
    use crate::escher::limits::DecodeLimits;
    use crate::escher::record::Record;

    fn decode_using(factory: &RecordFactory, data: &[u8]) -> Result<(EscherRecord, usize)> {
        let mut ctx = DecodeContext::with_factory(factory, DecodeLimits::DEFAULT);
        factory.create_record(data, 0, &mut ctx)
    }

    const DG: [u8; 16] = [
        0x10, 0x00, 0x08, 0xF0, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x04, 0x00,
        0x00,
    ];

    #[test]
    fn test_builtin_dispatch() {
        let factory = RecordFactory::builtin();
        assert_eq!(factory.kind(0xF00B), Some(RecordKind::Opt));
        assert_eq!(factory.kind(0xF00D), Some(RecordKind::Textbox));
        assert_eq!(factory.kind(0xF007), Some(RecordKind::Bse));
        assert_eq!(factory.kind(0xF010), Some(RecordKind::ClientAnchor));
        assert_eq!(factory.kind(0xF118), None);

        let (record, consumed) = decode_using(factory, &DG).unwrap();
        assert_eq!(consumed, 16);
        assert!(matches!(record, EscherRecord::Dg(_)));
    }

    #[test]
    fn test_unregister_falls_back_to_unknown() {
        let mut factory = RecordFactory::default();
        assert_eq!(factory.unregister(0xF008), Some(RecordKind::Dg));
        let (record, _) = decode_using(&factory, &DG).unwrap();
        match &record {
            EscherRecord::Unknown(unknown) => assert_eq!(unknown.payload(), Some(&DG[8..])),
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(record.to_bytes(), DG);
    }

    #[test]
    fn test_register_new_kind() {
        let mut factory = RecordFactory::empty();
        assert_eq!(factory.register(0xF0AA, RecordKind::Textbox), None);
        let bytes = [0x00, 0x00, 0xAA, 0xF0, 0x01, 0x00, 0x00, 0x00, 0x7F];
        let (record, _) = decode_using(&factory, &bytes).unwrap();
        assert!(matches!(record, EscherRecord::Textbox(_)));
        assert_eq!(record.record_id(), 0xF0AA);
    }

    #[test]
    fn test_container_flag_wins_over_leaf_kind() {
        // Opt id with the container version holds a Dg child
        let mut bytes = vec![0x0F, 0x00, 0x0B, 0xF0, 0x10, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&DG);
        let (record, _) = decode_using(RecordFactory::builtin(), &bytes).unwrap();
        let container = record.as_container().unwrap();
        assert_eq!(container.children().len(), 1);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_short_header() {
        let err = decode_using(RecordFactory::builtin(), &DG[..5]).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { offset: 0, needed: 8, available: 5 }));
    }

    #[test]
    fn test_custom_factory_reaches_children() {
        let mut factory = RecordFactory::default();
        factory.unregister(0xF008);
        let mut bytes = vec![0x0F, 0x00, 0x02, 0xF0, 0x10, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&DG);
        let (record, _) = decode_using(&factory, &bytes).unwrap();
        assert!(matches!(record.children(), [EscherRecord::Unknown(_)]));
    }
}
