//! Binary data parsing utilities shared across the codec.
//!
//! This module provides bounds-checked functions for reading little-endian
//! integers out of a byte slice, and a cursor for writing them into a
//! caller-sized destination buffer.

use super::error::{DecodeError, EncodeError, EncodeResult, Result};
use zerocopy::{FromBytes, I16, I32, LE, U16, U32};

#[inline]
fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| DecodeError::truncated(offset, len, 0))?;
    data.get(offset..end).ok_or_else(|| {
        DecodeError::truncated(offset, len, data.len().saturating_sub(offset))
    })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use litchi_escher::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = slice_at(data, offset, 2)?;
    U16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| DecodeError::truncated(offset, 2, bytes.len()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use litchi_escher::common::binary::read_i16_le;
/// let data = [0xFF, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -1i16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    let bytes = slice_at(data, offset, 2)?;
    I16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| DecodeError::truncated(offset, 2, bytes.len()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use litchi_escher::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = slice_at(data, offset, 4)?;
    U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| DecodeError::truncated(offset, 4, bytes.len()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    let bytes = slice_at(data, offset, 4)?;
    I32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| DecodeError::truncated(offset, 4, bytes.len()))
}

/// Read a fixed-size byte array (UIDs and similar) at the given offset.
#[inline]
pub fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let bytes = slice_at(data, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Borrow `len` bytes at the given offset, failing with `TruncatedInput`.
#[inline]
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    slice_at(data, offset, len)
}

/// Cursor writing little-endian values into a caller-supplied buffer.
///
/// Every write is bounds-checked; running out of room yields
/// [`EncodeError::BufferTooSmall`] with the absolute position that was needed.
pub struct ByteWriter<'buf> {
    buf: &'buf mut [u8],
    pos: usize,
}

impl<'buf> ByteWriter<'buf> {
    /// Create a writer positioned at `offset` within `buf`.
    #[inline]
    pub fn new(buf: &'buf mut [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    /// Current absolute position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fail early if `len` more bytes do not fit.
    #[inline]
    pub fn reserve(&self, len: usize) -> EncodeResult<()> {
        let needed = self.pos.saturating_add(len);
        if needed > self.buf.len() {
            return Err(EncodeError::BufferTooSmall {
                needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        self.reserve(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    #[inline]
    pub fn put_zeros(&mut self, len: usize) -> EncodeResult<()> {
        self.reserve(len)?;
        self.buf[self.pos..self.pos + len].fill(0);
        self.pos += len;
        Ok(())
    }

    #[inline]
    pub fn put_u8(&mut self, value: u8) -> EncodeResult<()> {
        self.put_bytes(&[value])
    }

    #[inline]
    pub fn put_u16(&mut self, value: u16) -> EncodeResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    #[inline]
    pub fn put_i16(&mut self, value: i16) -> EncodeResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    #[inline]
    pub fn put_u32(&mut self, value: u32) -> EncodeResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    #[inline]
    pub fn put_i32(&mut self, value: i32) -> EncodeResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }
}
