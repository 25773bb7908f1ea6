//! Authentication Module
//!
//! The chat core consumes identity, it does not manage it:
//!
//! - **`sessions`** - JWT verification (`TokenVerifier`)
//! - **`users`** - read-only user directory (display names, team members)
//!
//! Token issuance, signup and login belong to the account service.

/// Read-only user directory
pub mod users;

/// JWT token validation
pub mod sessions;

pub use sessions::{Claims, TokenVerifier};
pub use users::{PgUserDirectory, StaticUserDirectory, TeamMember, UserDirectory};
