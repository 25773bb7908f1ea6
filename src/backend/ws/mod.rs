//! WebSocket Transport
//!
//! The persistent connection clients chat over.
//!
//! - **`frames`** - JSON frame types
//! - **`session`** - per-connection state and frame dispatch
//! - **`handler`** - the `/ws` upgrade and socket pumps

pub mod frames;
pub mod handler;
pub mod session;

pub use frames::{InboundFrame, OutboundFrame};
pub use handler::ws_handler;
pub use session::WsSession;
