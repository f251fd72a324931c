//! Decode session state.
//!
//! A [`DecodeContext`] is threaded through every decoder. It carries the
//! allocation ceilings, the record factory used for child dispatch, the
//! current container nesting depth and the warnings raised so far.

use super::factory::RecordFactory;
use super::limits::DecodeLimits;
use crate::common::error::{DecodeError, DecodeWarning, Result};

/// Mutable state for a single decode pass.
#[derive(Debug)]
pub struct DecodeContext<'f> {
    limits: DecodeLimits,
    factory: &'f RecordFactory,
    warnings: Vec<DecodeWarning>,
    depth: usize,
}

impl DecodeContext<'static> {
    /// Session with the process-wide default limits and the built-in factory.
    pub fn new() -> Self {
        Self::with_limits(DecodeLimits::global())
    }

    /// Session with explicit limits and the built-in factory.
    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self::with_factory(RecordFactory::builtin(), limits)
    }
}

impl Default for DecodeContext<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f> DecodeContext<'f> {
    /// Session with a caller-supplied factory.
    pub fn with_factory(factory: &'f RecordFactory, limits: DecodeLimits) -> Self {
        Self {
            limits,
            factory,
            warnings: Vec::new(),
            depth: 0,
        }
    }

    #[inline]
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    #[inline]
    pub fn factory(&self) -> &'f RecordFactory {
        self.factory
    }

    /// Warnings raised so far, in the order they occurred.
    #[inline]
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Drain the collected warnings.
    pub fn take_warnings(&mut self) -> Vec<DecodeWarning> {
        std::mem::take(&mut self.warnings)
    }

    #[inline]
    pub(crate) fn warn(&mut self, warning: DecodeWarning) {
        self.warnings.push(warning);
    }

    /// Enter one container level, failing past `max_depth`.
    pub(crate) fn enter(&mut self) -> Result<()> {
        let depth = self.depth + 1;
        if depth > self.limits.max_depth {
            return Err(DecodeError::NestingTooDeep {
                depth,
                limit: self.limits.max_depth,
            });
        }
        self.depth = depth;
        Ok(())
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_limit() {
        let limits = DecodeLimits {
            max_depth: 2,
            ..DecodeLimits::DEFAULT
        };
        let mut ctx = DecodeContext::with_limits(limits);
        ctx.enter().unwrap();
        ctx.enter().unwrap();
        assert_eq!(
            ctx.enter(),
            Err(DecodeError::NestingTooDeep { depth: 3, limit: 2 })
        );
        ctx.leave();
        ctx.enter().unwrap();
    }

    #[test]
    fn test_take_warnings() {
        let mut ctx = DecodeContext::with_limits(DecodeLimits::DEFAULT);
        ctx.warn(DecodeWarning::UnparsedBytes {
            record_id: 0xF00B,
            offset: 0,
            len: 2,
        });
        assert_eq!(ctx.warnings().len(), 1);
        assert_eq!(ctx.take_warnings()[0].record_id(), 0xF00B);
        assert!(ctx.warnings().is_empty());
    }
}
