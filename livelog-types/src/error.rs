//! Error types for livelog.

use thiserror::Error;

/// Errors raised while turning an inbound event into a [`crate::LogRecord`].
///
/// Both variants are scoped to a single message: the caller drops that
/// message and keeps the connection.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The envelope decoded, but carried a different event category.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// The variant that was required at this level.
        expected: &'static str,
        /// The variant that was actually present.
        found: String,
    },

    /// The payload was not a valid JSON envelope.
    #[error("malformed event: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ConsoleError {
    /// Build a shape mismatch error.
    pub fn shape_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected,
            found: found.into(),
        }
    }
}
