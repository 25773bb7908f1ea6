/**
 * Backend Error Types
 *
 * The chat core distinguishes four outcomes a caller must react to
 * differently:
 *
 * - `NotFound` - the room or message does not exist; surfaced, never retried
 * - `AccessDenied` - non-member sending, non-owner deleting; surfaced
 * - `Transient` - a cache or broadcast hiccup; normally logged and swallowed
 *   by the services, only surfaced when it was the primary effect
 * - `FullFailure` - every read-state write path failed
 *
 * Everything else (bad input, missing token, store errors) maps onto plain
 * HTTP statuses.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::cache::CacheError;
use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use teamchat::backend::error::BackendError;
///
/// let err = BackendError::room_not_found(uuid::Uuid::nil());
/// assert_eq!(err.status_code().as_u16(), 404);
///
/// let err = BackendError::access_denied("Only the sender can delete a message");
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// A room, message or participant does not exist
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of resource ("chat room", "message", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The caller is not allowed to perform the operation
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Human-readable error message
        message: String,
    },

    /// A cache or broadcast backend is temporarily unavailable
    #[error("Transient backend failure: {message}")]
    Transient {
        /// Human-readable error message
        message: String,
    },

    /// Every write path of a multi-path operation failed
    #[error("All write paths failed: {message}")]
    FullFailure {
        /// Human-readable error message
        message: String,
    },

    /// The request was malformed
    #[error("Invalid request: {message}")]
    Validation {
        /// Human-readable error message
        message: String,
    },

    /// No or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Durable store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Shared error (from shared module)
    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn room_not_found(id: impl ToString) -> Self {
        Self::not_found("chat room", id)
    }

    pub fn message_not_found(id: impl ToString) -> Self {
        Self::not_found("message", id)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn full_failure(message: impl Into<String>) -> Self {
        Self::FullFailure {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `NotFound` - 404
    /// - `AccessDenied` - 403
    /// - `Unauthorized` - 401
    /// - `Validation` and shared validation errors - 400
    /// - `Transient` - 503
    /// - `FullFailure`, `Store`, `Serialization` - 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::FullFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shared(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::UnknownVariant { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::AccessDenied { message }
            | Self::Transient { message }
            | Self::FullFailure { message }
            | Self::Validation { message }
            | Self::Unauthorized { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<CacheError> for BackendError {
    fn from(err: CacheError) -> Self {
        Self::transient(err.to_string())
    }
}
