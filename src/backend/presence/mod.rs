//! Presence Module
//!
//! Online/offline tracking driven by connection lifecycle events.
//!
//! # Module Structure
//!
//! ```text
//! presence/
//! ├── mod.rs      - Module exports
//! ├── registry.rs - session id -> user id map of this instance
//! └── tracker.rs  - lifecycle handling and offline debounce
//! ```

pub mod registry;
pub mod tracker;

pub mod handlers;

pub use registry::SessionRegistry;
pub use tracker::{DisconnectOutcome, PresenceTracker};
