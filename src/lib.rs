//! Litchi Escher - a Rust codec for the Escher (OfficeArt) drawing format
//!
//! Escher records describe the vector drawings, shape groups and embedded
//! pictures of legacy Office binaries (.doc, .xls, .ppt) and of OOXML
//! packages. This library decodes an Escher byte stream into an owned,
//! editable record tree and encodes the tree back.
//!
//! # Features
//!
//! - **Typed records**: containers, shape options, drawing bookkeeping,
//!   shapes, anchors, textboxes and BLIPs
//! - **Lossless fallback**: unrecognized records are kept byte-for-byte
//! - **Tolerant parsing**: truncated input yields best-effort trees plus
//!   warnings instead of failures
//! - **Bounded allocation**: configurable ceilings guard every
//!   variable-length allocation against hostile length fields
//!
//! # Example - Decoding a drawing
//!
//! ```
//! use litchi_escher::escher::{self, DecodeContext, DecodeLimits};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // DgContainer holding one Dg record
//! let data = [
//!     0x0F, 0x00, 0x02, 0xF0, 0x10, 0x00, 0x00, 0x00,
//!     0x10, 0x00, 0x08, 0xF0, 0x08, 0x00, 0x00, 0x00,
//!     0x03, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00,
//! ];
//!
//! let mut ctx = DecodeContext::with_limits(DecodeLimits::uniform(1 << 20));
//! let (record, consumed) = escher::decode_with(&data, 0, &mut ctx)?;
//! assert_eq!(consumed, data.len());
//! assert_eq!(record.children().len(), 1);
//! assert!(ctx.warnings().is_empty());
//!
//! println!("{record}");
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Building and encoding a shape
//!
//! ```
//! use litchi_escher::escher::{
//!     ContainerRecord, EscherProperty, OptRecord, Record, SpRecord, ShapeFlags,
//! };
//!
//! let mut opt = OptRecord::new();
//! opt.set(EscherProperty::simple(0x0181, 0x00FF_0000)); // fill.fillcolor
//!
//! let mut shape = ContainerRecord::new(0xF004);
//! shape.add_child(SpRecord::new(1, 1025, ShapeFlags::HAVE_SPT).into());
//! shape.add_child(opt.into());
//!
//! let mut buf = vec![0u8; shape.record_size()];
//! let written = shape.encode(&mut buf, 0).unwrap();
//! assert_eq!(written, buf.len());
//! ```

/// Shared binary helpers and error types
pub mod common;

/// Escher record codec
///
/// This module provides the record tree, the per-record decoders and
/// encoders, the record factory and the decode session types.
pub mod escher;

// Re-export commonly used types for convenience
pub use common::error::{DecodeError, DecodeWarning, EncodeError, EncodeResult, Result};
pub use escher::{
    DecodeContext, DecodeLimits, EscherRecord, Record, decode, decode_all, decode_with, dump,
    encode,
};
