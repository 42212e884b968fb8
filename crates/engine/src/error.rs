//! Unified engine error types.
//!
//! Wraps translated backend errors together with the failures the engine
//! raises itself while compiling queries and materializing documents.

use docgraph_domain::DomainError;
use thiserror::Error;

use crate::infrastructure::ports::RepoError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No data source can be resolved for a declared type chain.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored data is missing or has an unusable shape.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Malformed query input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend cannot express the requested operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Database/repository operation failed.
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data_integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Attach a document id to a domain decoding failure.
    pub fn from_domain(document_id: &str, err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(format!("{} ({})", msg, document_id)),
            other => Self::DataIntegrity(format!("document '{}': {}", document_id, other)),
        }
    }

    /// Check if this is a not-found error from the repository.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_retryable())
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            other => Self::DataIntegrity(other.to_string()),
        }
    }
}
