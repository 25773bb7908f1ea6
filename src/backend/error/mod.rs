//! Backend Error Module
//!
//! Error types of the server side. Services return `BackendError`; handlers
//! return it directly since it implements `IntoResponse`.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - HTTP response conversion
//! ```
//!
//! Backend-specific errors (`StoreError`, `CacheError`) live next to their
//! backends and convert into `BackendError` with `?`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;

/// Result alias used across the backend
pub type BackendResult<T> = Result<T, BackendError>;
