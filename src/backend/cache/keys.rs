//! Cache key conventions
//!
//! These names are shared with every other instance talking to the same
//! Redis, so they must not change.

use uuid::Uuid;

/// Set of user ids with at least one live connection
pub const ONLINE_USERS: &str = "chat:online_users";

/// Hash `user_id -> last read message id` for one room
pub fn last_read(chatroom_id: Uuid) -> String {
    format!("chat:last_read_message:{}", chatroom_id)
}

/// Sorted set of serialized messages scored by epoch milliseconds
pub fn recent_messages(chatroom_id: Uuid) -> String {
    format!("chat:messages:{}", chatroom_id)
}

/// Per-(user, room) message counter
pub fn message_count(user_id: &str, chatroom_id: Uuid) -> String {
    format!("chat:message_count:{}:{}", user_id, chatroom_id)
}
