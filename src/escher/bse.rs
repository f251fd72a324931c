// Blip Store Entry (BSE) records
//
// BSE records live in the BStoreContainer (0xF001) and index the pictures of
// a document. The picture either follows the entry's fixed part as an
// embedded BLIP record, or sits in a host delay stream at `delay_offset`.
//
// References:
// - [MS-ODRAW] 2.2.32: OfficeArtBStoreContainerFileBlock
// - [MS-ODRAW] 2.2.33: OfficeArtFBSE

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::record::{EscherRecord, Record, clamped_body};
use super::types::EscherRecordType;
use crate::common::binary::{ByteWriter, read_array, read_bytes, read_u16_le, read_u32_le};
use crate::common::error::{DecodeError, DecodeWarning, EncodeResult, Result};
use tracing::warn;

const UID_SIZE: usize = 16;

/// Fixed part of the entry
///
/// ```text
/// Offset | Size | Field
/// -------|------|------
/// 0      | 1    | btWin32
/// 1      | 1    | btMacOS
/// 2      | 16   | rgbUid
/// 18     | 2    | tag
/// 20     | 4    | size
/// 24     | 4    | cRef
/// 28     | 4    | foDelay
/// 32     | 1    | usage
/// 33     | 1    | cbName
/// 34     | 1    | unused2
/// 35     | 1    | unused3
/// ```
const FIXED_SIZE: usize = 36;

/// Longest name `cbName` can describe.
const MAX_NAME_SIZE: usize = u8::MAX as usize;

/// Name of an MSOBLIPTYPE value.
pub const fn blip_type_name(blip_type: u8) -> &'static str {
    match blip_type {
        0x00 => "ERROR",
        0x02 => "EMF",
        0x03 => "WMF",
        0x04 => "PICT",
        0x05 => "JPEG",
        0x06 => "PNG",
        0x07 => "DIB",
        0x11 => "TIFF",
        0x12 => "CMYKJPEG",
        0x20..=0xFF => "CLIENT",
        _ => "UNKNOWN",
    }
}

/// Blip store entry (0xF007). The header instance is the BLIP type.
#[derive(Debug, Clone, PartialEq)]
pub struct BseRecord {
    version: u8,
    instance: u16,
    /// BLIP type on Windows
    pub blip_type_win32: u8,
    /// BLIP type on Mac
    pub blip_type_macos: u8,
    pub uid: [u8; UID_SIZE],
    /// Usually 0xFF
    pub tag: u16,
    /// Size of the BLIP record, header included
    pub size: u32,
    /// Number of shapes referencing the picture
    pub ref_count: u32,
    /// Offset of the BLIP in the host delay stream
    pub delay_offset: u32,
    pub usage: u8,
    pub unused2: u8,
    pub unused3: u8,
    name_data: Vec<u8>,
    blip: Option<Box<EscherRecord>>,
    trailing: Vec<u8>,
}

impl BseRecord {
    /// Entry for a picture of the given MSOBLIPTYPE, with no embedded BLIP.
    pub fn new(blip_type: u8) -> Self {
        Self {
            version: 0x02,
            instance: blip_type as u16,
            blip_type_win32: blip_type,
            blip_type_macos: blip_type,
            uid: [0; UID_SIZE],
            tag: 0x00FF,
            size: 0,
            ref_count: 1,
            delay_offset: 0,
            usage: 0,
            unused2: 0,
            unused3: 0,
            name_data: Vec::new(),
            blip: None,
            trailing: Vec::new(),
        }
    }

    /// Decode an entry; an embedded BLIP is decoded through the session's
    /// factory.
    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let declared = header.length as usize;
        if declared < FIXED_SIZE {
            return Err(DecodeError::malformed(
                header.record_id,
                offset,
                format!("BSE body of {declared} bytes is shorter than its {FIXED_SIZE}-byte header"),
            ));
        }

        let body_start = offset + HEADER_SIZE;
        let fixed = read_bytes(data, body_start, FIXED_SIZE)?;
        let name_len = fixed[33] as usize;
        if FIXED_SIZE + name_len > declared {
            return Err(DecodeError::malformed(
                header.record_id,
                offset,
                format!("BSE name of {name_len} bytes overruns a {declared}-byte body"),
            ));
        }

        let (body, truncated) = clamped_body(data, offset, header);
        if truncated {
            warn!(
                record_id = header.record_id,
                offset,
                declared,
                available = body.len(),
                "BSE runs past the end of the buffer, clamping"
            );
            ctx.warn(DecodeWarning::TruncatedPayload {
                record_id: header.record_id,
                offset,
                declared,
                available: body.len(),
            });
        }

        let name_end = (FIXED_SIZE + name_len).min(body.len());
        let name_data = body[FIXED_SIZE..name_end].to_vec();

        // The embedded record may not read past the entry's body
        let body_end = body_start + body.len();
        let scoped = &data[..body_end];
        let mut pos = body_start + name_end;
        let blip = if body_end - pos >= HEADER_SIZE {
            let factory = ctx.factory();
            ctx.enter()?;
            let decoded = factory.create_record(scoped, pos, ctx);
            ctx.leave();
            let (record, consumed) = decoded?;
            pos += consumed;
            Some(Box::new(record))
        } else {
            None
        };

        let trailing = data[pos..body_end].to_vec();
        if !trailing.is_empty() {
            warn!(
                record_id = header.record_id,
                offset = pos,
                len = trailing.len(),
                "BSE has bytes after its embedded blip"
            );
            ctx.warn(DecodeWarning::UnparsedBytes {
                record_id: header.record_id,
                offset: pos,
                len: trailing.len(),
            });
        }

        let record = Self {
            version: header.version,
            instance: header.instance,
            blip_type_win32: fixed[0],
            blip_type_macos: fixed[1],
            uid: read_array(fixed, 2)?,
            tag: read_u16_le(fixed, 18)?,
            size: read_u32_le(fixed, 20)?,
            ref_count: read_u32_le(fixed, 24)?,
            delay_offset: read_u32_le(fixed, 28)?,
            usage: fixed[32],
            unused2: fixed[34],
            unused3: fixed[35],
            name_data,
            blip,
            trailing,
        };
        Ok((record, body_end - offset))
    }

    /// Embedded BLIP record, if the picture is stored inline.
    #[inline]
    pub fn blip(&self) -> Option<&EscherRecord> {
        self.blip.as_deref()
    }

    pub fn blip_mut(&mut self) -> Option<&mut EscherRecord> {
        self.blip.as_deref_mut()
    }

    /// Embed (or drop) the BLIP; `size` follows the embedded record.
    pub fn set_blip(&mut self, blip: Option<EscherRecord>) {
        if let Some(record) = &blip {
            self.size = record.record_size() as u32;
        }
        self.blip = blip.map(Box::new);
    }

    /// Raw name bytes (`cbName` of them).
    #[inline]
    pub fn name_data(&self) -> &[u8] {
        &self.name_data
    }

    /// Name decoded from UTF-16LE, falling back to Latin-1.
    pub fn name(&self) -> Option<String> {
        if self.name_data.is_empty() {
            return None;
        }
        let units: Vec<u16> = self
            .name_data
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        let name = if self.name_data.len() % 2 == 0 {
            String::from_utf16(&units).ok()
        } else {
            None
        };
        Some(name.unwrap_or_else(|| {
            self.name_data
                .iter()
                .filter(|&&b| b != 0)
                .map(|&b| b as char)
                .collect()
        }))
    }

    /// Store `name` as null-terminated UTF-16LE, cut to what `cbName` can hold.
    pub fn set_name(&mut self, name: &str) {
        let mut bytes: Vec<u8> = name
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect();
        bytes.truncate(MAX_NAME_SIZE & !1);
        self.name_data = bytes;
    }

    /// Bytes kept from past the embedded BLIP.
    #[inline]
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.trailing
    }
}

impl Record for BseRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::BSE as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        FIXED_SIZE
            + self.name_data.len()
            + self.blip.as_ref().map_or(0, |blip| blip.record_size())
            + self.trailing.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_u8(self.blip_type_win32)?;
        writer.put_u8(self.blip_type_macos)?;
        writer.put_bytes(&self.uid)?;
        writer.put_u16(self.tag)?;
        writer.put_u32(self.size)?;
        writer.put_u32(self.ref_count)?;
        writer.put_u32(self.delay_offset)?;
        writer.put_u8(self.usage)?;
        writer.put_u8(self.name_data.len().min(MAX_NAME_SIZE) as u8)?;
        writer.put_u8(self.unused2)?;
        writer.put_u8(self.unused3)?;
        writer.put_bytes(&self.name_data)?;
        if let Some(blip) = &self.blip {
            blip.header().write(writer)?;
            blip.write_body(writer)?;
        }
        writer.put_bytes(&self.trailing)
    }
}
