//! Read receipts and read-status views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user has seen a message. Identified by `(message_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub message_id: Uuid,
    pub user_id: String,
    pub chatroom_id: Uuid,
    pub read_at: DateTime<Utc>,
}

impl ReadReceipt {
    pub fn new(chatroom_id: Uuid, message_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            message_id,
            user_id: user_id.into(),
            chatroom_id,
            read_at: Utc::now(),
        }
    }
}

/// Payload published on `room.<id>.read`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusEvent {
    pub chatroom_id: Uuid,
    pub user_id: String,
    pub last_read_message_id: Uuid,
}

/// One participant's entry in a "seen by" view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReaderInfo {
    pub user_id: String,
    pub read_at: Option<DateTime<Utc>>,
}

/// Active participants of a room split by whether they have read a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadStatus {
    pub message_id: Uuid,
    pub read_users: Vec<ReaderInfo>,
    pub unread_users: Vec<ReaderInfo>,
    pub read_count: usize,
    pub unread_count: usize,
}

impl MessageReadStatus {
    /// Split `participants` into readers and non-readers using `receipts`.
    ///
    /// Receipts from users who are no longer participants are ignored.
    pub fn build(message_id: Uuid, participants: &[String], receipts: &[ReadReceipt]) -> Self {
        let mut read_users = Vec::new();
        let mut unread_users = Vec::new();
        for user_id in participants {
            match receipts.iter().find(|r| &r.user_id == user_id) {
                Some(receipt) => read_users.push(ReaderInfo {
                    user_id: user_id.clone(),
                    read_at: Some(receipt.read_at),
                }),
                None => unread_users.push(ReaderInfo {
                    user_id: user_id.clone(),
                    read_at: None,
                }),
            }
        }
        Self {
            message_id,
            read_count: read_users.len(),
            unread_count: unread_users.len(),
            read_users,
            unread_users,
        }
    }
}

/// Unread count response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub chatroom_id: Uuid,
    pub unread_count: u64,
}
