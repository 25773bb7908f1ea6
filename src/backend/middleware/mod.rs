//! Middleware Module
//!
//! HTTP middleware of the backend server.
//!
//! - **`auth`** - session token verification for protected routes

pub mod auth;

pub use auth::{auth_middleware, authenticate, AuthUser, AuthenticatedUser};
