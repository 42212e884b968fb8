//! Error types for port operations.

/// Backend errors after translation from the store's native status codes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepoError {
    /// Document not found - includes type and key for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// A document with the same path already exists.
    #[error("Duplicate document: {0}")]
    Duplicate(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The backend rejected the request as malformed.
    #[error("Backend validation error: {0}")]
    Validation(String),

    /// Transient backend failure; safe to retry.
    #[error("Transient error in {operation}: {message}")]
    Transient {
        operation: &'static str,
        message: String,
    },

    /// Business precondition failed; retrying will not help.
    #[error("Business rule violated: {0}")]
    Business(String),

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    /// Create a NotFound error with type and id context.
    pub fn not_found(entity_type: impl ToString, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn transient(operation: &'static str, message: impl ToString) -> Self {
        Self::Transient {
            operation,
            message: message.to_string(),
        }
    }

    /// Translate a canonical backend status code.
    ///
    /// Unknown codes become non-retryable database errors.
    pub fn from_backend_code(code: &str, operation: &'static str, message: impl ToString) -> Self {
        let message = message.to_string();
        match code {
            "ALREADY_EXISTS" => Self::Duplicate(message),
            "NOT_FOUND" => Self::NotFound {
                entity_type: "document".to_string(),
                id: message,
            },
            "PERMISSION_DENIED" | "UNAUTHENTICATED" => Self::PermissionDenied(message),
            "INVALID_ARGUMENT" | "OUT_OF_RANGE" => Self::Validation(message),
            "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "ABORTED" | "RESOURCE_EXHAUSTED" | "INTERNAL" => {
                Self::Transient { operation, message }
            }
            "FAILED_PRECONDITION" => Self::Business(message),
            _ => Self::Database { operation, message },
        }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a caller-level retry policy may retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
