//! Backend Module
//!
//! Server-side code of the chat core, compiled with the `server` feature.
//!
//! # Architecture
//!
//! - **`presence`** - connection lifecycle to online/offline broadcasts
//! - **`chat`** - message delivery and room management
//! - **`receipts`** - read receipts and unread counts
//! - **`analysis`** - message-count trigger, mood analysis, AI assistant
//! - **`store`** - durable store (PostgreSQL or in-memory)
//! - **`cache`** - ephemeral cache (Redis or in-memory)
//! - **`realtime`** - topic hub and SSE subscriptions
//! - **`ws`** - WebSocket transport
//! - **`auth`** - token verification and user directory
//! - **`middleware`** - request authentication
//! - **`routes`** / **`server`** - router assembly, state, startup
//! - **`error`** - backend error types
//!
//! ```text
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── server/     - Server initialization and state
//! ├── routes/     - Route configuration
//! ├── chat/       - Delivery, rooms, handlers
//! ├── receipts/   - Read-receipt tracker
//! ├── presence/   - Presence tracker
//! ├── analysis/   - Side effects off the hot path
//! ├── store/      - Durable store
//! ├── cache/      - Ephemeral cache
//! ├── realtime/   - Event broadcasting
//! ├── ws/         - WebSocket transport
//! ├── auth/       - Authentication
//! ├── middleware/ - Request middleware
//! └── error/      - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` owns one instance of every service. Services are cheap to
//! clone and share their collaborators through `Arc`; per-user mutable state
//! lives in `DashMap`s inside the service that owns it. Fan-out uses one
//! `tokio::sync::broadcast` channel per topic.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Message delivery and rooms
pub mod chat;

/// Read receipts
pub mod receipts;

/// Presence tracking
pub mod presence;

/// Async side effects
pub mod analysis;

/// Durable store
pub mod store;

/// Ephemeral cache
pub mod cache;

/// Real-time update system
pub mod realtime;

/// WebSocket transport
pub mod ws;

/// Backend error types
pub mod error;

/// Authentication and user directory
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use error::{BackendError, BackendResult};
pub use realtime::RealtimeHub;
pub use server::create_app;
