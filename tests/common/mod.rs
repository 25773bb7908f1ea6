//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Application fixtures over in-memory backends
//! - Failure-injecting store and cache doubles
//! - Token helpers
//! - Custom assertion macros

pub mod assertions;
pub mod auth_helpers;
pub mod fixtures;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use doubles::*;
pub use fixtures::*;
