//! Error types for the Escher codec.
//!
//! Decoding distinguishes fatal structural errors ([`DecodeError`]) from
//! recoverable conditions ([`DecodeWarning`]) that still yield a record tree.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{DecodeError, DecodeWarning, EncodeError, EncodeResult, Result};
