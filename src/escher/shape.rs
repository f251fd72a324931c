//! Shape-level leaf records: Sp, Spgr, ChildAnchor, ClientAnchor and
//! SplitMenuColors.
//!
//! All but ClientAnchor have fixed-size bodies. A declared length that does
//! not match an accepted layout is `MalformedRecord`.

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::record::{Record, fixed_body};
use super::types::EscherRecordType;
use super::unknown::opaque_payload;
use crate::common::binary::{ByteWriter, read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use crate::common::error::{EncodeResult, Result};
use bitflags::bitflags;

// =============================================================================
// Shape Flags (MS-ODRAW 2.2.40)
// =============================================================================

bitflags! {
    /// Shape flags for the Sp record (MS-ODRAW 2.2.40)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeFlags: u32 {
        /// Shape is a group
        const GROUP = 0x0001;
        /// Shape is a child of a group
        const CHILD = 0x0002;
        /// Shape is the topmost group (patriarch)
        const PATRIARCH = 0x0004;
        /// Shape has been deleted
        const DELETED = 0x0008;
        /// Shape is an OLE object
        const OLE_SHAPE = 0x0010;
        /// Shape has a valid master
        const HAVE_MASTER = 0x0020;
        /// Shape is flipped horizontally
        const FLIP_H = 0x0040;
        /// Shape is flipped vertically
        const FLIP_V = 0x0080;
        /// Shape is a connector
        const CONNECTOR = 0x0100;
        /// Shape has an anchor
        const HAVE_ANCHOR = 0x0200;
        /// Shape is a background shape
        const BACKGROUND = 0x0400;
        /// Shape has a shape type property
        const HAVE_SPT = 0x0800;
    }
}

/// Rectangle in the coordinate space of the enclosing group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub const fn width(&self) -> i32 {
        self.right.wrapping_sub(self.left)
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        self.bottom.wrapping_sub(self.top)
    }

    fn read(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self::new(
            read_i32_le(data, offset)?,
            read_i32_le(data, offset + 4)?,
            read_i32_le(data, offset + 8)?,
            read_i32_le(data, offset + 12)?,
        ))
    }

    fn read_small(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self::new(
            read_i16_le(data, offset)? as i32,
            read_i16_le(data, offset + 2)? as i32,
            read_i16_le(data, offset + 4)? as i32,
            read_i16_le(data, offset + 6)? as i32,
        ))
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_i32(self.left)?;
        writer.put_i32(self.top)?;
        writer.put_i32(self.right)?;
        writer.put_i32(self.bottom)
    }
}

/// Shape atom (0xF00A). The header instance is the shape type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpRecord {
    version: u8,
    shape_type: u16,
    pub shape_id: u32,
    pub flags: ShapeFlags,
}

impl SpRecord {
    const BODY_SIZE: usize = 8;

    pub fn new(shape_type: u16, shape_id: u32, flags: ShapeFlags) -> Self {
        Self {
            version: 0x02,
            shape_type: shape_type & 0x0FFF,
            shape_id,
            flags,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = fixed_body(data, offset, header, &[Self::BODY_SIZE])?;
        let record = Self {
            version: header.version,
            shape_type: header.instance,
            shape_id: read_u32_le(body, 0)?,
            // Unknown bits survive the round trip
            flags: ShapeFlags::from_bits_retain(read_u32_le(body, 4)?),
        };
        Ok((record, HEADER_SIZE + Self::BODY_SIZE))
    }

    /// MSO shape type (rectangle, ellipse, ...).
    #[inline]
    pub fn shape_type(&self) -> u16 {
        self.shape_type
    }

    pub fn set_shape_type(&mut self, shape_type: u16) {
        self.shape_type = shape_type & 0x0FFF;
    }
}

impl Record for SpRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::Sp as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.shape_type
    }

    fn body_size(&self) -> usize {
        Self::BODY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_u32(self.shape_id)?;
        writer.put_u32(self.flags.bits())
    }
}

/// Group bounding rectangle (0xF009).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpgrRecord {
    version: u8,
    instance: u16,
    pub rect: Rect,
}

impl SpgrRecord {
    const BODY_SIZE: usize = 16;

    pub fn new(rect: Rect) -> Self {
        Self {
            version: 0x01,
            instance: 0,
            rect,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = fixed_body(data, offset, header, &[Self::BODY_SIZE])?;
        let record = Self {
            version: header.version,
            instance: header.instance,
            rect: Rect::read(body, 0)?,
        };
        Ok((record, HEADER_SIZE + Self::BODY_SIZE))
    }
}

impl Record for SpgrRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::Spgr as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        Self::BODY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        self.rect.write(writer)
    }
}

/// Position of a shape inside its group (0xF00F).
///
/// Decodes either the 16-byte rectangle or the 8-byte small rectangle, as
/// selected by the declared body length; always encodes the 16-byte form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildAnchorRecord {
    version: u8,
    instance: u16,
    pub rect: Rect,
}

impl ChildAnchorRecord {
    const BODY_SIZE: usize = 16;
    const SMALL_BODY_SIZE: usize = 8;

    pub fn new(rect: Rect) -> Self {
        Self {
            version: 0x00,
            instance: 0,
            rect,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = fixed_body(
            data,
            offset,
            header,
            &[Self::BODY_SIZE, Self::SMALL_BODY_SIZE],
        )?;
        let rect = if body.len() == Self::BODY_SIZE {
            Rect::read(body, 0)?
        } else {
            Rect::read_small(body, 0)?
        };
        let record = Self {
            version: header.version,
            instance: header.instance,
            rect,
        };
        Ok((record, HEADER_SIZE + body.len()))
    }
}

impl Record for ChildAnchorRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::ChildAnchor as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        Self::BODY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        self.rect.write(writer)
    }
}

/// Cell anchor written by spreadsheet hosts: two corners, each a column and
/// row with an offset inside the cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellAnchor {
    pub flag: u16,
    pub col1: u16,
    pub dx1: u16,
    pub row1: u16,
    pub dy1: u16,
    pub col2: u16,
    pub dx2: u16,
    pub row2: u16,
    pub dy2: u16,
}

impl CellAnchor {
    const SIZE: usize = 18;

    fn read(data: &[u8]) -> Result<Self> {
        let field = |i: usize| read_u16_le(data, i * 2);
        Ok(Self {
            flag: field(0)?,
            col1: field(1)?,
            dx1: field(2)?,
            row1: field(3)?,
            dy1: field(4)?,
            col2: field(5)?,
            dx2: field(6)?,
            row2: field(7)?,
            dy2: field(8)?,
        })
    }

    fn fields(&self) -> [u16; 9] {
        [
            self.flag, self.col1, self.dx1, self.row1, self.dy1, self.col2, self.dx2, self.row2,
            self.dy2,
        ]
    }
}

/// Host anchor (0xF010).
///
/// Bodies of at least 18 bytes are read as a [`CellAnchor`]; shorter bodies
/// use host layouts of their own and are kept as raw bytes, as is anything
/// past the cell anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAnchorRecord {
    version: u8,
    instance: u16,
    pub cells: Option<CellAnchor>,
    extra: Vec<u8>,
}

impl ClientAnchorRecord {
    pub fn new(cells: CellAnchor) -> Self {
        Self {
            version: 0x00,
            instance: 0,
            cells: Some(cells),
            extra: Vec::new(),
        }
    }

    /// Anchor in a host layout this crate does not interpret.
    pub fn with_raw(data: Vec<u8>) -> Self {
        Self {
            version: 0x00,
            instance: 0,
            cells: None,
            extra: data,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let limit = ctx.limits().max_unknown_payload;
        let mut body = opaque_payload(data, offset, header, "client anchor payload", limit, ctx)?;
        let consumed = HEADER_SIZE + body.len();
        let cells = if body.len() >= CellAnchor::SIZE {
            let cells = CellAnchor::read(&body)?;
            body.drain(..CellAnchor::SIZE);
            Some(cells)
        } else {
            None
        };
        let record = Self {
            version: header.version,
            instance: header.instance,
            cells,
            extra: body,
        };
        Ok((record, consumed))
    }

    /// Host bytes not covered by the cell anchor.
    #[inline]
    pub fn extra_bytes(&self) -> &[u8] {
        &self.extra
    }
}

impl Record for ClientAnchorRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::ClientAnchor as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        self.cells.map_or(0, |_| CellAnchor::SIZE) + self.extra.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        if let Some(cells) = &self.cells {
            for field in cells.fields() {
                writer.put_u16(field)?;
            }
        }
        writer.put_bytes(&self.extra)
    }
}

/// Colours of the split menus in the drawing UI (0xF11E).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMenuColorsRecord {
    version: u8,
    instance: u16,
    pub fill_color: u32,
    pub line_color: u32,
    pub shadow_color: u32,
    pub color_3d: u32,
}

impl SplitMenuColorsRecord {
    const BODY_SIZE: usize = 16;

    pub fn new(fill_color: u32, line_color: u32, shadow_color: u32, color_3d: u32) -> Self {
        Self {
            version: 0x00,
            instance: 0x0004,
            fill_color,
            line_color,
            shadow_color,
            color_3d,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = fixed_body(data, offset, header, &[Self::BODY_SIZE])?;
        let record = Self {
            version: header.version,
            instance: header.instance,
            fill_color: read_u32_le(body, 0)?,
            line_color: read_u32_le(body, 4)?,
            shadow_color: read_u32_le(body, 8)?,
            color_3d: read_u32_le(body, 12)?,
        };
        Ok((record, HEADER_SIZE + Self::BODY_SIZE))
    }

    #[inline]
    pub fn colors(&self) -> [u32; 4] {
        [
            self.fill_color,
            self.line_color,
            self.shadow_color,
            self.color_3d,
        ]
    }
}

impl Record for SplitMenuColorsRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::SplitMenuColors as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        Self::BODY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        for color in self.colors() {
            writer.put_u32(color)?;
        }
        Ok(())
    }
}
