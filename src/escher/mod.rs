//! Escher (OfficeArt) drawing record codec.
//!
//! Escher is Microsoft's drawing layer format, embedded in DOC, XLS and PPT
//! files and in OOXML packages. A drawing is a tree of records: containers
//! (version 0xF) whose bodies are further records, and leaves with typed
//! bodies.
//!
//! # Architecture
//!
//! - **Owned trees**: decoding produces an owned [`EscherRecord`] tree that
//!   can be edited and encoded back
//! - **Derived lengths**: header lengths are recomputed on encode
//! - **Tolerant parsing**: truncated containers and opaque payloads decode
//!   best-effort, reporting [`DecodeWarning`]s on the [`DecodeContext`]
//! - **Bounded allocation**: every variable-length allocation is checked
//!   against [`DecodeLimits`] first
//!
//! # Modules
//!
//! - `header`: 8-byte record header codec
//! - `record`: record trait and the [`EscherRecord`] enum
//! - `container`: container records and the shared child decoder
//! - `properties`: property table codec (Opt records)
//! - `opt`, `drawing`, `shape`, `textbox`, `blip`, `bse`: leaf record kinds
//! - `unknown`: lossless fallback for unregistered record ids
//! - `factory`: record id to decoder dispatch
//! - `dump`: readable rendering of record trees
//!
//! # Example
//!
//! ```
//! use litchi_escher::escher::{self, DgRecord, EscherRecord, Record};
//!
//! let dg = DgRecord::new(1, 3, 1024);
//! let bytes = dg.to_bytes();
//!
//! let (record, consumed) = escher::decode(&bytes, 0)?;
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(record, EscherRecord::Dg(dg));
//! # Ok::<(), litchi_escher::DecodeError>(())
//! ```

pub mod blip;
pub mod bse;
pub mod container;
pub mod context;
pub mod drawing;
pub mod dump;
pub mod factory;
pub mod header;
pub mod limits;
pub mod opt;
pub mod properties;
pub mod property_names;
pub mod record;
pub mod shape;
pub mod textbox;
pub mod types;
pub mod unknown;

pub use blip::{BitmapBlipRecord, MetafileBlipRecord};
pub use bse::BseRecord;
pub use container::{ChildList, ContainerRecord};
pub use context::DecodeContext;
pub use drawing::{DgRecord, DggRecord, FileIdCluster};
pub use dump::dump;
pub use factory::{RecordFactory, RecordKind};
pub use header::{HEADER_SIZE, RecordHeader};
pub use limits::DecodeLimits;
pub use opt::OptRecord;
pub use properties::{ArrayProperty, EscherProperty, PropertyFlags, PropertyId};
pub use property_names::property_name;
pub use record::{EscherRecord, Record};
pub use shape::{
    CellAnchor, ChildAnchorRecord, ClientAnchorRecord, Rect, ShapeFlags, SpRecord, SpgrRecord,
    SplitMenuColorsRecord,
};
pub use textbox::TextboxRecord;
pub use types::{EscherRecordType, record_name};
pub use unknown::{UnknownContents, UnknownRecord};

use crate::common::error::{DecodeWarning, EncodeResult, Result};
use tracing::warn;

/// Decode one record at `offset` with the process-wide limits.
///
/// Returns the record and the bytes consumed. Warnings are logged and
/// dropped; use [`decode_with`] to collect them.
pub fn decode(data: &[u8], offset: usize) -> Result<(EscherRecord, usize)> {
    decode_with(data, offset, &mut DecodeContext::new())
}

/// Decode one record at `offset` within an explicit session.
pub fn decode_with(
    data: &[u8],
    offset: usize,
    ctx: &mut DecodeContext<'_>,
) -> Result<(EscherRecord, usize)> {
    let factory = ctx.factory();
    factory.create_record(data, offset, ctx)
}

/// Decode consecutive top-level records until the buffer ends.
pub fn decode_all(data: &[u8]) -> Result<Vec<EscherRecord>> {
    decode_all_with(data, &mut DecodeContext::new())
}

/// Decode consecutive top-level records within an explicit session.
///
/// A tail shorter than a record header is ignored with an `UnparsedBytes`
/// warning.
pub fn decode_all_with(data: &[u8], ctx: &mut DecodeContext<'_>) -> Result<Vec<EscherRecord>> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        if data.len() - pos < HEADER_SIZE {
            warn!(offset = pos, len = data.len() - pos, "Ignoring bytes after the last record");
            ctx.warn(DecodeWarning::UnparsedBytes {
                record_id: 0,
                offset: pos,
                len: data.len() - pos,
            });
            break;
        }
        let (record, consumed) = decode_with(data, pos, ctx)?;
        records.push(record);
        pos += consumed;
    }
    Ok(records)
}

/// Encode `record` at `offset`; `buf` must hold `record.record_size()` bytes
/// past `offset`.
pub fn encode(record: &EscherRecord, buf: &mut [u8], offset: usize) -> EncodeResult<usize> {
    record.encode(buf, offset)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn opt_strategy() -> impl Strategy<Value = EscherRecord> {
        // 0x0180..0x0190 holds no array properties
        let property = prop_oneof![
            (0x0180u16..0x0190, any::<i32>()).prop_map(|(n, v)| EscherProperty::simple(n, v)),
            (0x0180u16..0x0190, any::<i32>()).prop_map(|(n, v)| EscherProperty::blip(n, v)),
            (0x0180u16..0x0190, prop::collection::vec(any::<u8>(), 0..24))
                .prop_map(|(n, d)| EscherProperty::complex(n, d)),
        ];
        prop::collection::vec(property, 0..8).prop_map(|properties| {
            let mut opt = OptRecord::new();
            for property in properties {
                opt.set(property);
            }
            opt.into()
        })
    }

    fn leaf_strategy() -> impl Strategy<Value = EscherRecord> {
        prop_oneof![
            (0u16..0x1000, any::<u32>(), any::<u32>())
                .prop_map(|(id, n, last)| DgRecord::new(id, n, last).into()),
            (0u16..0x1000, any::<u32>(), any::<u32>()).prop_map(|(ty, id, flags)| {
                SpRecord::new(ty, id, ShapeFlags::from_bits_retain(flags)).into()
            }),
            any::<[i32; 4]>()
                .prop_map(|[l, t, r, b]| SpgrRecord::new(Rect::new(l, t, r, b)).into()),
            any::<[i32; 4]>()
                .prop_map(|[l, t, r, b]| ChildAnchorRecord::new(Rect::new(l, t, r, b)).into()),
            prop::collection::vec(any::<u8>(), 0..32)
                .prop_map(|data| TextboxRecord::new(data).into()),
            (0u8..0x0F, 0u16..0x1000, prop::collection::vec(any::<u8>(), 0..32))
                .prop_map(|(ver, inst, data)| UnknownRecord::leaf(0xF134, ver, inst, data).into()),
            prop::collection::vec(any::<u8>(), 0..64)
                .prop_map(|data| BitmapBlipRecord::new(0xF01E, data).into()),
            any::<[u16; 9]>().prop_map(|v| {
                ClientAnchorRecord::new(CellAnchor {
                    flag: v[0],
                    col1: v[1],
                    dx1: v[2],
                    row1: v[3],
                    dy1: v[4],
                    col2: v[5],
                    dx2: v[6],
                    row2: v[7],
                    dy2: v[8],
                })
                .into()
            }),
            // Shorter than a cell anchor, so kept raw
            prop::collection::vec(any::<u8>(), 0..18)
                .prop_map(|data| ClientAnchorRecord::with_raw(data).into()),
            (
                "[a-z]{0,12}",
                prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
                any::<u32>()
            )
                .prop_map(|(name, picture, ref_count)| {
                    let mut bse = BseRecord::new(0x06);
                    bse.ref_count = ref_count;
                    bse.set_name(&name);
                    bse.set_blip(picture.map(|p| BitmapBlipRecord::new(0xF01E, p).into()));
                    bse.into()
                }),
            opt_strategy(),
        ]
    }

    fn tree_strategy() -> impl Strategy<Value = EscherRecord> {
        leaf_strategy().prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                (
                    prop::sample::select(vec![0xF002u16, 0xF003, 0xF004]),
                    prop::collection::vec(inner.clone(), 0..6)
                )
                    .prop_map(|(id, children)| ContainerRecord::with_children(id, children).into()),
                (0u16..0x1000, prop::collection::vec(inner, 0..6))
                    .prop_map(|(inst, children)| UnknownRecord::container(0xF177, inst, children).into()),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_round_trip(tree in tree_strategy()) {
            let bytes = tree.to_bytes();
            let mut ctx = DecodeContext::with_limits(DecodeLimits::DEFAULT);
            let (decoded, consumed) = decode_with(&bytes, 0, &mut ctx).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            prop_assert!(ctx.warnings().is_empty());
            prop_assert_eq!(decoded, tree);
        }

        #[test]
        fn prop_size_contract(tree in tree_strategy()) {
            let size = tree.record_size();
            let mut buf = vec![0u8; size];
            prop_assert_eq!(encode(&tree, &mut buf, 0).unwrap(), size);
            prop_assert_eq!(tree.header().length as usize, size - HEADER_SIZE);

            let mut short = vec![0u8; size - 1];
            prop_assert!(encode(&tree, &mut short, 0).is_err());
        }
    }
}
