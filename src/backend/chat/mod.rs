//! Chat Module
//!
//! Rooms and messages.
//!
//! - **`delivery`** - the send path: authorize, persist, fan out, mirror, trigger
//! - **`rooms`** - room lifecycle, membership and notification settings
//! - **`handlers`** - REST handlers for rooms, history, roulette and team members
//!
//! ```text
//! chat/
//! ├── mod.rs      - Module exports and documentation
//! ├── delivery.rs - MessageDeliveryService
//! ├── rooms.rs    - RoomService
//! └── handlers.rs - HTTP handlers
//! ```

/// Message delivery
pub mod delivery;

/// Room management
pub mod rooms;

/// HTTP handlers
pub mod handlers;

pub use delivery::{Delivered, MessageDeliveryService, MAX_PAGE_SIZE};
pub use rooms::RoomService;
