//! Human-readable dump of decoded record trees.
//!
//! Each record prints as one header line followed by its fields, indented by
//! nesting depth:
//!
//! ```text
//! DgContainer (0xF002) ver=0xF inst=0x000 len=16
//!   Dg (0xF008) ver=0x0 inst=0x001 len=8
//!     num_shapes: 3
//!     last_shape_id: 1024
//! ```

use super::bse::blip_type_name;
use super::decode_all;
use super::record::{EscherRecord, Record};
use super::unknown::UnknownContents;
use crate::common::error::Result;
use std::fmt::{self, Write};

/// Bytes shown before a payload preview is cut short.
const PREVIEW_LEN: usize = 32;

/// Decode every top-level record in `data` and render the trees.
pub fn dump(data: &[u8]) -> Result<String> {
    let records = decode_all(data)?;
    let mut out = String::new();
    for record in &records {
        let _ = write!(out, "{record}");
    }
    Ok(out)
}

impl fmt::Display for EscherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_record(f, self, 0)
    }
}

fn write_record(f: &mut fmt::Formatter<'_>, record: &EscherRecord, depth: usize) -> fmt::Result {
    let pad = depth * 2;
    writeln!(
        f,
        "{:pad$}{} (0x{:04X}) ver=0x{:X} inst=0x{:03X} len={}",
        "",
        record.record_name(),
        record.record_id(),
        record.version(),
        record.instance(),
        record.body_size(),
    )?;

    let pad = pad + 2;
    match record {
        EscherRecord::Container(_) => {},
        EscherRecord::Opt(opt) => {
            for property in opt.properties() {
                writeln!(f, "{:pad$}{property}", "")?;
            }
            if !opt.trailing_bytes().is_empty() {
                writeln!(f, "{:pad$}unparsed: {}", "", HexPreview(opt.trailing_bytes()))?;
            }
        },
        EscherRecord::Dg(dg) => {
            writeln!(f, "{:pad$}num_shapes: {}", "", dg.num_shapes())?;
            writeln!(f, "{:pad$}last_shape_id: {}", "", dg.last_shape_id())?;
        },
        EscherRecord::Dgg(dgg) => {
            writeln!(f, "{:pad$}shape_id_max: {}", "", dgg.shape_id_max)?;
            writeln!(f, "{:pad$}num_id_clusters: {}", "", dgg.num_id_clusters())?;
            writeln!(f, "{:pad$}num_shapes_saved: {}", "", dgg.num_shapes_saved)?;
            writeln!(f, "{:pad$}drawings_saved: {}", "", dgg.drawings_saved)?;
            for cluster in dgg.clusters() {
                writeln!(
                    f,
                    "{:pad$}cluster: dg={} used={}",
                    "", cluster.drawing_group_id, cluster.num_shape_ids_used
                )?;
            }
        },
        EscherRecord::Sp(sp) => {
            writeln!(f, "{:pad$}shape_id: {}", "", sp.shape_id)?;
            writeln!(f, "{:pad$}flags: 0x{:08X} {:?}", "", sp.flags.bits(), sp.flags)?;
        },
        EscherRecord::Spgr(spgr) => writeln!(f, "{:pad$}rect: {:?}", "", spgr.rect)?,
        EscherRecord::ChildAnchor(anchor) => writeln!(f, "{:pad$}rect: {:?}", "", anchor.rect)?,
        EscherRecord::ClientAnchor(anchor) => {
            if let Some(c) = &anchor.cells {
                writeln!(f, "{:pad$}flag: 0x{:04X}", "", c.flag)?;
                writeln!(
                    f,
                    "{:pad$}from: col={} dx={} row={} dy={}",
                    "", c.col1, c.dx1, c.row1, c.dy1
                )?;
                writeln!(
                    f,
                    "{:pad$}to: col={} dx={} row={} dy={}",
                    "", c.col2, c.dx2, c.row2, c.dy2
                )?;
            }
            if !anchor.extra_bytes().is_empty() {
                writeln!(f, "{:pad$}data: {}", "", HexPreview(anchor.extra_bytes()))?;
            }
        },
        EscherRecord::Bse(bse) => {
            writeln!(
                f,
                "{:pad$}btWin32: 0x{:02X} {}  btMacOS: 0x{:02X} {}",
                "",
                bse.blip_type_win32,
                blip_type_name(bse.blip_type_win32),
                bse.blip_type_macos,
                blip_type_name(bse.blip_type_macos)
            )?;
            writeln!(f, "{:pad$}uid: {}", "", HexPreview(&bse.uid))?;
            writeln!(f, "{:pad$}tag: 0x{:04X}", "", bse.tag)?;
            writeln!(f, "{:pad$}size: {}", "", bse.size)?;
            writeln!(f, "{:pad$}ref_count: {}", "", bse.ref_count)?;
            writeln!(f, "{:pad$}delay_offset: 0x{:08X}", "", bse.delay_offset)?;
            writeln!(f, "{:pad$}usage: {}", "", bse.usage)?;
            if let Some(name) = bse.name() {
                writeln!(f, "{:pad$}name: {name}", "")?;
            }
            if let Some(blip) = bse.blip() {
                write_record(f, blip, depth + 1)?;
            }
            if !bse.trailing_bytes().is_empty() {
                writeln!(f, "{:pad$}unparsed: {}", "", HexPreview(bse.trailing_bytes()))?;
            }
        },
        EscherRecord::SplitMenuColors(colors) => {
            for (name, value) in ["fill", "line", "shadow", "3d"].iter().zip(colors.colors()) {
                writeln!(f, "{:pad$}{name}: 0x{value:08X}", "")?;
            }
        },
        EscherRecord::Textbox(textbox) => {
            writeln!(f, "{:pad$}data: {}", "", HexPreview(textbox.data()))?;
        },
        EscherRecord::MetafileBlip(blip) => {
            writeln!(f, "{:pad$}uid: {}", "", HexPreview(&blip.uid))?;
            if let Some(uid) = blip.primary_uid() {
                writeln!(f, "{:pad$}primary_uid: {}", "", HexPreview(uid))?;
            }
            writeln!(f, "{:pad$}uncompressed_size: {}", "", blip.uncompressed_size())?;
            writeln!(f, "{:pad$}bounds: {:?}", "", blip.bounds)?;
            writeln!(f, "{:pad$}size_emu: {:?}", "", blip.size_emu)?;
            writeln!(f, "{:pad$}compressed_size: {}", "", blip.compressed_size())?;
            writeln!(f, "{:pad$}compression: 0x{:02X}", "", blip.compression())?;
            writeln!(f, "{:pad$}filter: 0x{:02X}", "", blip.filter)?;
            writeln!(f, "{:pad$}data: {}", "", HexPreview(blip.picture_data()))?;
            if let Some(trailing) = blip.trailing_bytes() {
                writeln!(f, "{:pad$}unparsed: {}", "", HexPreview(trailing))?;
            }
        },
        EscherRecord::BitmapBlip(blip) => {
            writeln!(f, "{:pad$}uid: {}", "", HexPreview(&blip.uid))?;
            if let Some(uid) = blip.primary_uid() {
                writeln!(f, "{:pad$}primary_uid: {}", "", HexPreview(uid))?;
            }
            writeln!(f, "{:pad$}marker: 0x{:02X}", "", blip.marker)?;
            writeln!(f, "{:pad$}data: {}", "", HexPreview(blip.picture_data()))?;
        },
        EscherRecord::Unknown(unknown) => {
            if let Some(payload) = unknown.payload() {
                writeln!(f, "{:pad$}data: {}", "", HexPreview(payload))?;
            }
        },
    }

    for child in record.children() {
        write_record(f, child, depth + 1)?;
    }

    let (trailing, remaining) = match record {
        EscherRecord::Container(c) => (c.trailing_bytes(), c.remaining_length()),
        EscherRecord::Unknown(u) => match u.contents() {
            UnknownContents::Children(list) => (list.trailing(), list.remaining_length()),
            UnknownContents::Payload(_) => (&[][..], 0),
        },
        _ => (&[][..], 0),
    };
    if !trailing.is_empty() {
        writeln!(f, "{:pad$}trailing: {}", "", HexPreview(trailing))?;
    }
    if remaining > 0 {
        writeln!(f, "{:pad$}remaining_length: {remaining}", "")?;
    }
    Ok(())
}

/// Space-separated hex of the first bytes of a payload.
struct HexPreview<'a>(&'a [u8]);

impl fmt::Display for HexPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} bytes]", self.0.len())?;
        for byte in self.0.iter().take(PREVIEW_LEN) {
            write!(f, " {byte:02X}")?;
        }
        if self.0.len() > PREVIEW_LEN {
            f.write_str(" ...")?;
        }
        Ok(())
    }
}
