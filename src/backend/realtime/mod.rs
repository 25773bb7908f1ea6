//! Real-time Update Module
//!
//! Topic-based fan-out shared by every transport.
//!
//! - **`broadcast`** - `RealtimeHub`, one broadcast channel per topic
//! - **`subscription`** - Server-Sent Events stream over hub topics
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - RealtimeHub and broadcasting helpers
//! └── subscription.rs - SSE subscription handler
//! ```
//!
//! The WebSocket transport subscribes to the same hub, so a message
//! published once reaches both SSE and WebSocket clients of its topic.

/// Event broadcasting utilities
pub mod broadcast;

/// Server-Sent Events subscription handler
pub mod subscription;

pub use broadcast::{broadcast_event, RealtimeEventBroadcast, RealtimeHub};
pub use subscription::handle_realtime_subscription;
