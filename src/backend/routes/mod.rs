//! Route Configuration Module
//!
//! HTTP routes of the backend server, grouped by surface.
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation and the health probe
//! ├── chat_routes.rs  - WebSocket and SSE transports
//! └── api_routes.rs   - REST surface under /api/v1
//! ```

/// Main router creation
pub mod router;

/// Real-time transport routes
pub mod chat_routes;

/// REST endpoints
pub mod api_routes;

pub use router::create_router;
