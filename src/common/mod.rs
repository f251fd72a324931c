//! Common plumbing shared by the Escher codec modules.
//!
//! This module provides little-endian binary helpers and the error taxonomy
//! used by every record decoder and encoder.

// Submodule declarations
pub mod binary;
pub mod error;

// Re-exports for convenience
pub use error::{DecodeError, DecodeWarning, EncodeError, EncodeResult, Result};
