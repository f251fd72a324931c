//! Error conversion implementations.
//!
//! Hosts usually move Escher bytes through `std::io` streams (OLE2 streams,
//! ZIP parts); these conversions let codec errors flow into `io::Result`.

use super::types::{DecodeError, EncodeError};
use std::io;

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        let kind = match err {
            DecodeError::TruncatedInput { .. } => io::ErrorKind::UnexpectedEof,
            DecodeError::OversizeAllocation { .. } => io::ErrorKind::OutOfMemory,
            DecodeError::MalformedRecord { .. } | DecodeError::NestingTooDeep { .. } => {
                io::ErrorKind::InvalidData
            },
        };
        io::Error::new(kind, err)
    }
}

impl From<EncodeError> for io::Error {
    fn from(err: EncodeError) -> Self {
        io::Error::new(io::ErrorKind::WriteZero, err)
    }
}
