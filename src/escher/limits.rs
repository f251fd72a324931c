//! Allocation ceilings for decoding untrusted input.
//!
//! Every variable-length allocation made while decoding is checked against a
//! ceiling from [`DecodeLimits`] before any memory is reserved, so a hostile
//! length field can never drive an out-of-memory condition.
//!
//! The process-wide default only seeds new decode sessions; the decoders
//! themselves read limits from the session they are handed.

use crate::common::error::{DecodeError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default ceiling for variable-length payloads (100 MB).
pub const DEFAULT_MAX_RECORD_LENGTH: usize = 100_000_000;

/// Default ceiling for container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

static GLOBAL_LIMITS: RwLock<DecodeLimits> = parking_lot::const_rwlock(DecodeLimits::DEFAULT);

/// Per-concern allocation ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Largest complex/array property payload
    pub max_property_payload: usize,
    /// Largest BLIP payload, stored or inflated
    pub max_blip_payload: usize,
    /// Largest opaque payload of an unrecognized record
    pub max_unknown_payload: usize,
    /// Largest textbox / client data payload
    pub max_textbox_payload: usize,
    /// Deepest container nesting
    pub max_depth: usize,
}

impl DecodeLimits {
    pub const DEFAULT: Self = Self {
        max_property_payload: DEFAULT_MAX_RECORD_LENGTH,
        max_blip_payload: DEFAULT_MAX_RECORD_LENGTH,
        max_unknown_payload: DEFAULT_MAX_RECORD_LENGTH,
        max_textbox_payload: DEFAULT_MAX_RECORD_LENGTH,
        max_depth: DEFAULT_MAX_DEPTH,
    };

    /// Same ceiling for every payload kind.
    pub const fn uniform(max_payload: usize) -> Self {
        Self {
            max_property_payload: max_payload,
            max_blip_payload: max_payload,
            max_unknown_payload: max_payload,
            max_textbox_payload: max_payload,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Snapshot of the process-wide default limits.
    pub fn global() -> Self {
        *GLOBAL_LIMITS.read()
    }

    /// Replace the process-wide default limits used by new sessions.
    pub fn set_global(limits: Self) {
        *GLOBAL_LIMITS.write() = limits;
    }

    /// Fail with `OversizeAllocation` if `requested` exceeds `limit`.
    #[inline]
    pub(crate) fn check(what: &'static str, requested: usize, limit: usize) -> Result<()> {
        if requested > limit {
            return Err(DecodeError::OversizeAllocation {
                what,
                requested,
                limit,
            });
        }
        Ok(())
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        assert!(DecodeLimits::check("payload", 10, 10).is_ok());
        assert_eq!(
            DecodeLimits::check("payload", 11, 10),
            Err(DecodeError::OversizeAllocation {
                what: "payload",
                requested: 11,
                limit: 10
            })
        );
    }

    #[test]
    fn test_uniform() {
        let limits = DecodeLimits::uniform(64);
        assert_eq!(limits.max_blip_payload, 64);
        assert_eq!(limits.max_textbox_payload, 64);
        assert_eq!(limits.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_default_matches_const() {
        assert_eq!(DecodeLimits::default(), DecodeLimits::DEFAULT);
    }
}
