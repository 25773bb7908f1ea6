//! Shared Error Types
//!
//! This module defines error types that are shared between the wire types and
//! the server. These errors represent failures that can happen while building,
//! validating or decoding chat data, independent of any storage backend.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures (empty content, bad ids)
//! - `UnknownVariant` - A stored string did not map to a known enum variant
//!
//! # Usage
//!
//! ```rust
//! use teamchat::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content cannot be empty");
//! assert!(error.to_string().contains("content"));
//! ```
use thiserror::Error;

/// Shared error types that can occur while handling chat data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A persisted or inbound string did not name a known variant
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Which enum was being parsed (e.g. "room type")
        kind: &'static str,
        /// The offending value
        value: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-variant error
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
