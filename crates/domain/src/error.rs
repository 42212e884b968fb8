//! Unified error types for the domain layer
//!
//! Raised while decoding stored payloads and keys into domain values. The
//! engine maps these onto its own taxonomy together with the document id.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A composite key does not have the expected shape
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A stored reference is neither a bare key nor a `{key}` envelope
    #[error("Malformed reference '{name}': {message}")]
    MalformedReference { name: String, message: String },

    /// Native timestamp outside the representable date range
    #[error("Invalid timestamp: {seconds}s {nanoseconds}ns")]
    InvalidTimestamp { seconds: i64, nanoseconds: u32 },

    /// Payload section could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for malformed input.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid key error
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create a malformed reference error for the named reference.
    pub fn malformed_reference(name: impl Into<String>, message: impl ToString) -> Self {
        Self::MalformedReference {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
