//! Chat Data Model
//!
//! Wire and domain types for the chat core:
//!
//! - [`room`] - rooms, participants and the denormalized last-message summary
//! - [`message`] - messages, send requests and history pages
//! - [`receipt`] - read receipts and "seen by" views
//! - [`presence`] - online/offline notifications
//!
//! All timestamps are `DateTime<Utc>`; all JSON uses camelCase field names.

pub mod message;
pub mod presence;
pub mod receipt;
pub mod room;

pub use message::{ChatMessage, MessagePage, MessageType, SendMessageRequest, MAX_CONTENT_LENGTH};
pub use presence::{OnlineUsers, UserStatusMessage};
pub use receipt::{MessageReadStatus, ReadReceipt, ReadStatusEvent, ReaderInfo, UnreadCount};
pub use room::{
    ChatRoom, ChatRoomSummary, ChatRoomType, CreateChatRoomRequest, LastMessageInfo,
    NotificationSetting, Participant, RoomReadSummary,
};
