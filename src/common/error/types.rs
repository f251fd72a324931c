//! Error and warning types for the Escher codec.
//!
//! Structural problems abort the decode of the record that triggered them and
//! bubble up through every enclosing container. Recoverable conditions are not
//! errors: they are reported as [`DecodeWarning`]s on the decode session and
//! the best-effort record tree is still returned.
use thiserror::Error;

/// Fatal decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than required to read a header or a fixed-shape body
    #[error("Truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record's declared shape does not match any accepted layout
    #[error("Malformed record 0x{record_id:04X} at offset {offset}: {reason}")]
    MalformedRecord {
        record_id: u16,
        offset: usize,
        reason: String,
    },

    /// A declared length exceeds the configured allocation ceiling
    #[error("Refusing to allocate {requested} bytes for {what} (limit {limit})")]
    OversizeAllocation {
        what: &'static str,
        requested: usize,
        limit: usize,
    },

    /// Containers nested deeper than the configured ceiling
    #[error("Container nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
}

impl DecodeError {
    #[inline]
    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Self::TruncatedInput {
            offset,
            needed,
            available,
        }
    }

    #[inline]
    pub(crate) fn malformed(record_id: u16, offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_id,
            offset,
            reason: reason.into(),
        }
    }
}

/// Encoding errors. There is no partial-write recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Destination buffer cannot hold the serialized record
    #[error("Buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Recoverable conditions met while decoding.
///
/// Each warning is also logged through `tracing` at the point it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Container declared more bytes than the buffer holds
    TruncatedContainer {
        record_id: u16,
        offset: usize,
        remaining_length: u32,
    },
    /// BLIP payload failed to inflate and was kept as stored
    DecompressionFailure {
        record_id: u16,
        offset: usize,
        reason: String,
    },
    /// Opaque payload shorter than declared, clamped to the buffer
    TruncatedPayload {
        record_id: u16,
        offset: usize,
        declared: usize,
        available: usize,
    },
    /// Bytes inside a record body that the record layout does not describe
    UnparsedBytes {
        record_id: u16,
        offset: usize,
        len: usize,
    },
    /// A stored count disagrees with the entries actually present
    CountMismatch {
        record_id: u16,
        offset: usize,
        stored: u32,
        expected: u32,
    },
}

impl DecodeWarning {
    /// Record id of the record that raised the warning.
    pub fn record_id(&self) -> u16 {
        match self {
            Self::TruncatedContainer { record_id, .. }
            | Self::DecompressionFailure { record_id, .. }
            | Self::TruncatedPayload { record_id, .. }
            | Self::UnparsedBytes { record_id, .. }
            | Self::CountMismatch { record_id, .. } => *record_id,
        }
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Result type for encoding operations.
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
