//! Link transform error types.

use thiserror::Error;

use super::ResolveError;

/// Outcome of a transform that produced no rewritten text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The input holds no link this transform recognizes.
    #[error("no matching link")]
    NoMatch,

    /// A link could not be followed to its destination.
    #[error("link resolution failed: {0}")]
    Resolution(#[from] ResolveError),
}

impl TransformError {
    /// Returns whether this is the expected no-match outcome.
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}
