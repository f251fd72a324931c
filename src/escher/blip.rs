// BLIP (Binary Large Image or Picture) records
//
// Metafile BLIPs (EMF, WMF, PICT) carry bounds metadata and a payload that is
// usually deflate-compressed. Bitmap BLIPs (JPEG, PNG, DIB, TIFF) store the
// picture bytes verbatim after a one-byte marker.
//
// References:
// - [MS-ODRAW] 2.2.23: OfficeArtBlip records

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::limits::DecodeLimits;
use super::record::Record;
use super::shape::Rect;
use super::types::EscherRecordType;
use crate::common::binary::{ByteWriter, read_array, read_bytes, read_i32_le, read_u32_le};
use crate::common::error::{DecodeError, DecodeWarning, EncodeResult, Result};
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use std::io::{self, Read, Write};
use tracing::warn;

/// Compression flag: payload is deflate-compressed.
pub const COMPRESSION_DEFLATE: u8 = 0x00;
/// Compression flag: payload is stored as-is.
pub const COMPRESSION_NONE: u8 = 0xFE;
/// Filter flag written by Office (no filter).
pub const FILTER_NONE: u8 = 0xFE;

const UID_SIZE: usize = 16;
/// uncompressed size + bounds + EMU size + compressed size + 2 flag bytes
const METAFILE_FIXED_SIZE: usize = 4 + 16 + 8 + 4 + 1 + 1;

/// Signatures (options form) of each BLIP record type.
fn signatures(record_id: u16) -> &'static [u16] {
    match record_id {
        0xF01A => &[0x3D40], // EMF
        0xF01B => &[0x2160], // WMF
        0xF01C => &[0x5420], // PICT
        0xF01D => &[0x46A0, 0x6E20], // JPEG, RGB or CMYK
        0xF01E => &[0x6E00], // PNG
        0xF01F => &[0x7A80], // DIB
        0xF029 => &[0x6E40], // TIFF
        0xF02A => &[0x6E20], // CMYK JPEG
        _ => &[],
    }
}

/// A second UID follows the first iff `options ^ signature == 0x10`.
fn has_primary_uid(header: &RecordHeader) -> bool {
    let options = header.options();
    signatures(header.record_id)
        .iter()
        .any(|signature| options ^ signature == 0x10)
}

/// Instance for a freshly built BLIP of the given type.
fn default_instance(record_id: u16, with_primary_uid: bool) -> u16 {
    let base = signatures(record_id).first().map_or(0, |s| s >> 4);
    if with_primary_uid { base ^ 0x1 } else { base }
}

/// Inflate `raw`, producing at most `limit` bytes.
///
/// The outer result fails only on the ceiling; a corrupt stream is reported
/// through the inner result so the caller can fall back to the raw bytes.
fn inflate(raw: &[u8], limit: usize) -> Result<io::Result<Vec<u8>>> {
    let cap = limit as u64 + 1;
    let mut out = Vec::new();
    // ZLIB wrapper starts with 0x78, otherwise raw DEFLATE
    let read = if raw.first() == Some(&0x78) {
        ZlibDecoder::new(raw).take(cap).read_to_end(&mut out)
    } else {
        DeflateDecoder::new(raw).take(cap).read_to_end(&mut out)
    };
    if let Err(e) = read {
        return Ok(Err(e));
    }
    DecodeLimits::check("inflated blip payload", out.len(), limit)?;
    Ok(Ok(out))
}

fn read_uid(data: &[u8], offset: usize) -> Result<[u8; UID_SIZE]> {
    read_array::<UID_SIZE>(data, offset)
}

/// Metafile BLIP (EMF 0xF01A, WMF 0xF01B, PICT 0xF01C).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafileBlipRecord {
    record_id: u16,
    version: u8,
    instance: u16,
    /// MD4 digest of the uncompressed picture
    pub uid: [u8; UID_SIZE],
    primary_uid: Option<[u8; UID_SIZE]>,
    uncompressed_size: u32,
    /// Clipping bounds in metafile units
    pub bounds: Rect,
    /// Picture size in EMU (width, height)
    pub size_emu: (i32, i32),
    compression: u8,
    pub filter: u8,
    raw_data: Vec<u8>,
    picture_data: Vec<u8>,
    trailing: Vec<u8>,
}

impl MetafileBlipRecord {
    /// Empty metafile BLIP of the given type, stored uncompressed.
    pub fn new(record_id: u16) -> Self {
        Self {
            record_id,
            version: 0x00,
            instance: default_instance(record_id, false),
            uid: [0; UID_SIZE],
            primary_uid: None,
            uncompressed_size: 0,
            bounds: Rect::default(),
            size_emu: (0, 0),
            compression: COMPRESSION_NONE,
            filter: FILTER_NONE,
            raw_data: Vec::new(),
            picture_data: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body_start = offset + HEADER_SIZE;
        let body_end = body_start.saturating_add(header.length as usize);
        let with_primary = has_primary_uid(header);
        let fixed = UID_SIZE * (1 + with_primary as usize) + METAFILE_FIXED_SIZE;
        if (header.length as usize) < fixed {
            return Err(DecodeError::malformed(
                header.record_id,
                offset,
                format!("metafile blip body of {} bytes is shorter than its {fixed}-byte header", header.length),
            ));
        }

        let mut pos = body_start;
        let uid = read_uid(data, pos)?;
        pos += UID_SIZE;
        let primary_uid = if with_primary {
            let uid = read_uid(data, pos)?;
            pos += UID_SIZE;
            Some(uid)
        } else {
            None
        };

        let uncompressed_size = read_u32_le(data, pos)?;
        let bounds = Rect::new(
            read_i32_le(data, pos + 4)?,
            read_i32_le(data, pos + 8)?,
            read_i32_le(data, pos + 12)?,
            read_i32_le(data, pos + 16)?,
        );
        let size_emu = (read_i32_le(data, pos + 20)?, read_i32_le(data, pos + 24)?);
        let compressed_size = read_u32_le(data, pos + 28)? as usize;
        let flags = read_bytes(data, pos + 32, 2)?;
        let (compression, filter) = (flags[0], flags[1]);
        pos += METAFILE_FIXED_SIZE;

        let limit = ctx.limits().max_blip_payload;
        DecodeLimits::check("blip payload", compressed_size, limit)?;
        if pos + compressed_size > body_end {
            return Err(DecodeError::malformed(
                header.record_id,
                pos,
                format!("compressed size {compressed_size} overruns the record body"),
            ));
        }
        let raw_data = read_bytes(data, pos, compressed_size)?.to_vec();
        pos += compressed_size;

        let picture_data = if compression == COMPRESSION_DEFLATE {
            match inflate(&raw_data, limit)? {
                Ok(inflated) => inflated,
                Err(e) => {
                    warn!(
                        record_id = header.record_id,
                        offset,
                        error = %e,
                        "Failed to inflate blip payload, keeping stored bytes"
                    );
                    ctx.warn(DecodeWarning::DecompressionFailure {
                        record_id: header.record_id,
                        offset,
                        reason: e.to_string(),
                    });
                    raw_data.clone()
                },
            }
        } else {
            raw_data.clone()
        };

        // Anything after the payload is kept verbatim, clamped to the buffer
        let trailing_end = body_end.min(data.len());
        let trailing = data
            .get(pos..trailing_end)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        if trailing_end < body_end {
            warn!(
                record_id = header.record_id,
                offset,
                declared = header.length,
                "Blip record runs past the end of the buffer, clamping trailing bytes"
            );
            ctx.warn(DecodeWarning::TruncatedPayload {
                record_id: header.record_id,
                offset,
                declared: header.length as usize,
                available: trailing_end - body_start,
            });
        }
        pos += trailing.len();

        let record = Self {
            record_id: header.record_id,
            version: header.version,
            instance: header.instance,
            uid,
            primary_uid,
            uncompressed_size,
            bounds,
            size_emu,
            compression,
            filter,
            raw_data,
            picture_data,
            trailing,
        };
        Ok((record, pos - offset))
    }

    /// The second UID, present only for the signature-plus-one instance.
    #[inline]
    pub fn primary_uid(&self) -> Option<&[u8; UID_SIZE]> {
        self.primary_uid.as_ref()
    }

    /// Set or clear the second UID; the instance follows.
    pub fn set_primary_uid(&mut self, uid: Option<[u8; UID_SIZE]>) {
        self.instance = default_instance(self.record_id, uid.is_some());
        self.primary_uid = uid;
    }

    #[inline]
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// Stored payload length.
    #[inline]
    pub fn compressed_size(&self) -> u32 {
        self.raw_data.len() as u32
    }

    #[inline]
    pub fn compression(&self) -> u8 {
        self.compression
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compression == COMPRESSION_DEFLATE
    }

    /// Payload as stored in the record (possibly compressed).
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    /// Decoded picture bytes.
    #[inline]
    pub fn picture_data(&self) -> &[u8] {
        &self.picture_data
    }

    /// Replace the picture; it is stored zlib-compressed.
    pub fn set_picture_data(&mut self, picture: Vec<u8>) -> io::Result<()> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&picture)?;
        self.raw_data = encoder.finish()?;
        self.uncompressed_size = picture.len() as u32;
        self.compression = COMPRESSION_DEFLATE;
        self.picture_data = picture;
        Ok(())
    }

    /// Bytes after the payload that the layout does not describe.
    pub fn trailing_bytes(&self) -> Option<&[u8]> {
        (!self.trailing.is_empty()).then_some(&self.trailing[..])
    }
}

impl Record for MetafileBlipRecord {
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
        UID_SIZE * (1 + self.primary_uid.is_some() as usize)
            + METAFILE_FIXED_SIZE
            + self.raw_data.len()
            + self.trailing.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_bytes(&self.uid)?;
        if let Some(uid) = &self.primary_uid {
            writer.put_bytes(uid)?;
        }
        writer.put_u32(self.uncompressed_size)?;
        self.bounds.write(writer)?;
        writer.put_i32(self.size_emu.0)?;
        writer.put_i32(self.size_emu.1)?;
        writer.put_u32(self.compressed_size())?;
        writer.put_u8(self.compression)?;
        writer.put_u8(self.filter)?;
        writer.put_bytes(&self.raw_data)?;
        writer.put_bytes(&self.trailing)
    }
}

/// Bitmap BLIP (JPEG, PNG, DIB, TIFF, CMYK JPEG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapBlipRecord {
    record_id: u16,
    version: u8,
    instance: u16,
    pub uid: [u8; UID_SIZE],
    primary_uid: Option<[u8; UID_SIZE]>,
    /// Usually 0xFF
    pub marker: u8,
    picture_data: Vec<u8>,
}

impl BitmapBlipRecord {
    pub fn new(record_id: u16, picture_data: Vec<u8>) -> Self {
        Self {
            record_id,
            version: 0x00,
            instance: default_instance(record_id, false),
            uid: [0; UID_SIZE],
            primary_uid: None,
            marker: 0xFF,
            picture_data,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body_start = offset + HEADER_SIZE;
        let with_primary = has_primary_uid(header);
        let fixed = UID_SIZE * (1 + with_primary as usize) + 1;
        let declared = header.length as usize;
        if declared < fixed {
            return Err(DecodeError::malformed(
                header.record_id,
                offset,
                format!("bitmap blip body of {declared} bytes is shorter than its {fixed}-byte header"),
            ));
        }
        DecodeLimits::check("blip payload", declared - fixed, ctx.limits().max_blip_payload)?;

        let mut pos = body_start;
        let uid = read_uid(data, pos)?;
        pos += UID_SIZE;
        let primary_uid = if with_primary {
            let uid = read_uid(data, pos)?;
            pos += UID_SIZE;
            Some(uid)
        } else {
            None
        };
        let marker = read_bytes(data, pos, 1)?[0];
        pos += 1;

        let wanted = declared - fixed;
        let available = data.len().saturating_sub(pos).min(wanted);
        if available < wanted {
            warn!(
                record_id = header.record_id,
                offset,
                declared,
                "Bitmap blip runs past the end of the buffer, clamping"
            );
            ctx.warn(DecodeWarning::TruncatedPayload {
                record_id: header.record_id,
                offset,
                declared,
                available: fixed + available,
            });
        }
        let picture_data = read_bytes(data, pos, available)?.to_vec();
        pos += available;

        let record = Self {
            record_id: header.record_id,
            version: header.version,
            instance: header.instance,
            uid,
            primary_uid,
            marker,
            picture_data,
        };
        Ok((record, pos - offset))
    }

    #[inline]
    pub fn primary_uid(&self) -> Option<&[u8; UID_SIZE]> {
        self.primary_uid.as_ref()
    }

    pub fn set_primary_uid(&mut self, uid: Option<[u8; UID_SIZE]>) {
        self.instance = default_instance(self.record_id, uid.is_some());
        self.primary_uid = uid;
    }

    #[inline]
    pub fn picture_data(&self) -> &[u8] {
        &self.picture_data
    }

    pub fn set_picture_data(&mut self, picture: Vec<u8>) {
        self.picture_data = picture;
    }

    /// File extension of the picture format.
    pub fn extension(&self) -> &'static str {
        match EscherRecordType::from(self.record_id) {
            EscherRecordType::BlipJpeg | EscherRecordType::BlipCmykJpeg => "jpg",
            EscherRecordType::BlipPng => "png",
            EscherRecordType::BlipDib => "dib",
            EscherRecordType::BlipTiff => "tiff",
            _ => "bin",
        }
    }
}

impl Record for BitmapBlipRecord {
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
        UID_SIZE * (1 + self.primary_uid.is_some() as usize) + 1 + self.picture_data.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_bytes(&self.uid)?;
        if let Some(uid) = &self.primary_uid {
            writer.put_bytes(uid)?;
        }
        writer.put_u8(self.marker)?;
        writer.put_bytes(&self.picture_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::record::EscherRecord;
    use crate::escher::{decode, decode_with};
    use flate2::write::DeflateEncoder;

    fn ctx() -> DecodeContext<'static> {
        DecodeContext::with_limits(DecodeLimits::DEFAULT)
    }

    fn wmf_picture() -> Vec<u8> {
        let mut picture = vec![0x01, 0x00, 0x09, 0x00, 0x00, 0x03];
        picture.extend(std::iter::repeat_n(0x42u8, 512));
        picture
    }

    fn metafile_bytes(options: u16, compression: u8, payload: &[u8], trailing: &[u8]) -> Vec<u8> {
        let with_primary = (options ^ 0x2160) == 0x10;
        let body_len = 16 * (1 + with_primary as usize) + 34 + payload.len() + trailing.len();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&options.to_le_bytes());
        bytes.extend_from_slice(&0xF01Bu16.to_le_bytes());
        bytes.extend_from_slice(&(body_len as u32).to_le_bytes());
        bytes.extend_from_slice(&[0x11; 16]);
        if with_primary {
            bytes.extend_from_slice(&[0x22; 16]);
        }
        bytes.extend_from_slice(&600u32.to_le_bytes());
        for v in [0i32, 0, 1000, 800, 914_400, 731_520] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.push(compression);
        bytes.push(FILTER_NONE);
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(trailing);
        bytes
    }

    fn metafile(record: &EscherRecord) -> &MetafileBlipRecord {
        match record {
            EscherRecord::MetafileBlip(blip) => blip,
            other => panic!("expected MetafileBlip, got {other:?}"),
        }
    }

    #[test]
    fn test_stored_metafile() {
        let bytes = metafile_bytes(0x2160, COMPRESSION_NONE, b"WMFDATA", &[]);
        let (record, consumed) = decode(&bytes, 0).unwrap();
        assert_eq!(consumed, bytes.len());
        let blip = metafile(&record);
        assert!(blip.primary_uid().is_none());
        assert_eq!(blip.picture_data(), b"WMFDATA");
        assert_eq!(blip.bounds, Rect::new(0, 0, 1000, 800));
        assert_eq!(blip.size_emu, (914_400, 731_520));
        assert_eq!(blip.uncompressed_size(), 600);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_primary_uid_present() {
        let bytes = metafile_bytes(0x2170, COMPRESSION_NONE, b"abc", &[]);
        let (record, _) = decode(&bytes, 0).unwrap();
        let blip = metafile(&record);
        assert_eq!(blip.primary_uid(), Some(&[0x22; 16]));
        assert_eq!(blip.instance(), 0x217);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_zlib_payload_inflated() {
        let picture = wmf_picture();
        let mut blip = MetafileBlipRecord::new(0xF01B);
        blip.set_picture_data(picture.clone()).unwrap();
        assert!(blip.is_compressed());
        assert!(blip.raw_data().len() < picture.len());
        assert_eq!(blip.uncompressed_size() as usize, picture.len());

        let bytes = blip.to_bytes();
        let (record, _) = decode(&bytes, 0).unwrap();
        let decoded = metafile(&record);
        assert_eq!(decoded.picture_data(), &picture[..]);
        assert_eq!(decoded.compressed_size(), blip.compressed_size());
        assert_eq!(record, EscherRecord::MetafileBlip(blip));
    }

    #[test]
    fn test_raw_deflate_payload() {
        let picture = wmf_picture();
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&picture).unwrap();
        let compressed = encoder.finish().unwrap();

        let bytes = metafile_bytes(0x2160, COMPRESSION_DEFLATE, &compressed, &[]);
        let (record, _) = decode(&bytes, 0).unwrap();
        assert_eq!(metafile(&record).picture_data(), &picture[..]);
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_decompression_failure_is_warning() {
        let garbage = [0x78, 0x01, 0xFF, 0xFF, 0xFF];
        let bytes = metafile_bytes(0x2160, COMPRESSION_DEFLATE, &garbage, &[]);
        let mut ctx = ctx();
        let (record, _) = decode_with(&bytes, 0, &mut ctx).unwrap();
        assert_eq!(metafile(&record).picture_data(), &garbage);
        assert!(matches!(
            ctx.warnings(),
            [DecodeWarning::DecompressionFailure { record_id: 0xF01B, .. }]
        ));
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_inflate_bounded() {
        let mut blip = MetafileBlipRecord::new(0xF01A);
        blip.set_picture_data(vec![0u8; 4096]).unwrap();
        let bytes = blip.to_bytes();

        let limits = DecodeLimits {
            max_blip_payload: 256,
            ..DecodeLimits::DEFAULT
        };
        let mut ctx = DecodeContext::with_limits(limits);
        assert!(matches!(
            decode_with(&bytes, 0, &mut ctx),
            Err(DecodeError::OversizeAllocation { what: "inflated blip payload", limit: 256, .. })
        ));
    }

    #[test]
    fn test_compressed_size_over_limit() {
        let mut bytes = metafile_bytes(0x2160, COMPRESSION_NONE, b"", &[]);
        // Patch the compressed size field to a huge value
        let field = 8 + 16 + 28;
        bytes[field..field + 4].copy_from_slice(&0x7FFF_FFFFu32.to_le_bytes());
        let mut ctx = DecodeContext::with_limits(DecodeLimits::uniform(1024));
        assert!(matches!(
            decode_with(&bytes, 0, &mut ctx),
            Err(DecodeError::OversizeAllocation { what: "blip payload", .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_kept_and_clamped() {
        let bytes = metafile_bytes(0x2160, COMPRESSION_NONE, b"xy", &[7, 8, 9]);
        let (record, _) = decode(&bytes, 0).unwrap();
        assert_eq!(metafile(&record).trailing_bytes(), Some(&[7u8, 8, 9][..]));
        assert_eq!(record.to_bytes(), bytes);

        // Drop the last trailing byte from the buffer
        let short = &bytes[..bytes.len() - 1];
        let mut ctx = ctx();
        let (record, consumed) = decode_with(short, 0, &mut ctx).unwrap();
        assert_eq!(consumed, short.len());
        assert_eq!(metafile(&record).trailing_bytes(), Some(&[7u8, 8][..]));
        assert!(matches!(ctx.warnings(), [DecodeWarning::TruncatedPayload { .. }]));
    }

    #[test]
    fn test_payload_must_be_present() {
        let bytes = metafile_bytes(0x2160, COMPRESSION_NONE, b"payload", &[]);
        let short = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode(short, 0),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_set_primary_uid_updates_instance() {
        let mut blip = MetafileBlipRecord::new(0xF01A);
        assert_eq!(blip.header().options(), 0x3D40);
        blip.set_primary_uid(Some([5; 16]));
        assert_eq!(blip.header().options(), 0x3D50);
        let (record, _) = decode(&blip.to_bytes(), 0).unwrap();
        assert_eq!(metafile(&record).primary_uid(), Some(&[5; 16]));
    }

    #[test]
    fn test_bitmap_round_trip() {
        let mut png = BitmapBlipRecord::new(0xF01E, b"\x89PNG\r\n\x1a\nrest".to_vec());
        png.uid = [0xAB; 16];
        assert_eq!(png.header().options(), 0x6E00);
        assert_eq!(png.extension(), "png");

        let bytes = png.to_bytes();
        assert_eq!(bytes.len(), 8 + 16 + 1 + 12);
        let (record, consumed) = decode(&bytes, 0).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(record, EscherRecord::BitmapBlip(png));
    }

    #[test]
    fn test_bitmap_with_primary_uid() {
        let mut jpeg = BitmapBlipRecord::new(0xF01D, vec![0xFF, 0xD8, 0xFF]);
        jpeg.set_primary_uid(Some([1; 16]));
        assert_eq!(jpeg.header().options(), 0x46B0);
        let (record, _) = decode(&jpeg.to_bytes(), 0).unwrap();
        match &record {
            EscherRecord::BitmapBlip(b) => {
                assert_eq!(b.primary_uid(), Some(&[1; 16]));
                assert_eq!(b.picture_data(), &[0xFF, 0xD8, 0xFF]);
            },
            other => panic!("expected BitmapBlip, got {other:?}"),
        }
    }
}
