//! Engine error types.
//!
//! Expected data shapes (empty groups, missing GPA histograms, unrecognized
//! grade codes) never produce an error. Only internally inconsistent input
//! does, so callers can tell a bad data feed apart from a sparse one.

use thiserror::Error;

/// Errors raised by the aggregation engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A histogram could not be merged without producing skewed sums.
    #[error("malformed histogram in {context}: {reason}")]
    MalformedHistogram { context: String, reason: String },

    /// A configured percentile band width is outside `(0, 100]`.
    #[error("invalid percentile width {0}: must be in (0, 100]")]
    InvalidPercentileWidth(f64),

    /// A merge or population weight is negative or not finite.
    #[error("invalid merge weight {0}: must be finite and non-negative")]
    InvalidWeight(f64),
}

impl EngineError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::MalformedHistogram {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error comes from record data rather than configuration.
    pub fn is_data_error(&self) -> bool {
        matches!(self, EngineError::MalformedHistogram { .. })
    }
}
