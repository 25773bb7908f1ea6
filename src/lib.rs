// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! TeamChat - Real-time chat core
//!
//! TeamChat is the chat subsystem of a team-collaboration backend: message
//! delivery over a persistent connection, read-receipt tracking across a
//! durable store and an ephemeral cache, online-presence management, and a
//! background mood-analysis trigger.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire and domain types
//!   - Rooms, messages, receipts, presence notifications
//!   - Real-time events and topic names
//!   - Configuration and shared error types
//!
//! - **`backend`** - Server-side code (only compiled with the `server` feature)
//!   - Presence tracker, message delivery, read receipts, analysis trigger
//!   - Durable store (PostgreSQL or in-memory) and ephemeral cache (Redis or in-memory)
//!   - WebSocket transport, SSE subscriptions and the REST surface
//!
//! # Feature Flags
//!
//! - **`server`** (default) - Enables the backend, Axum, sqlx, redis and the
//!   `teamchat-server` binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use teamchat::backend::server::init::create_app;
//!
//! # async fn example() {
//! let app = create_app().await;
//! // Serve with axum::serve
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Every service is `Send + Sync` and shared through `Arc`. Per-connection
//! state lives in `DashMap`s owned by the service that mutates it, and fan-out
//! uses `tokio::sync::broadcast` channels per topic.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "server")]
pub mod backend;
