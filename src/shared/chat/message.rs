//! Chat Message Data Structure
//!
//! Represents a message in a room. A message is immutable once stored except
//! for its soft-delete marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::room::LastMessageInfo;
use crate::shared::error::SharedError;

/// Maximum accepted content length in characters
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Plain text message
    #[default]
    Text,
    /// Image message; the URL travels in `metadata`
    Image,
    /// File attachment; details travel in `metadata`
    File,
    /// System message (e.g. roulette results, joins)
    System,
}

impl MessageType {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Image => "IMAGE",
            MessageType::File => "FILE",
            MessageType::System => "SYSTEM",
        }
    }

    /// Parse from the stored representation
    pub fn parse(value: &str) -> Result<Self, SharedError> {
        match value {
            "TEXT" => Ok(MessageType::Text),
            "IMAGE" => Ok(MessageType::Image),
            "FILE" => Ok(MessageType::File),
            "SYSTEM" => Ok(MessageType::System),
            other => Err(SharedError::unknown_variant("message type", other)),
        }
    }
}

/// A persisted chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chatroom_id: Uuid,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    /// Always UTC, stamped by the server
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Build a new message from a send request with a fresh id and a UTC timestamp
    pub fn from_request(request: &SendMessageRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            chatroom_id: request.chatroom_id,
            sender_id: request.sender_id.clone(),
            sender_name: request.sender_name.clone(),
            message_type: request.message_type,
            content: request.content.clone(),
            metadata: request.metadata.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Mark the message deleted; the first deletion timestamp is kept
    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(Utc::now());
        }
    }

    /// Epoch-millisecond score used to order the recent-message cache
    pub fn score(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }

    pub fn to_last_message_info(&self) -> LastMessageInfo {
        LastMessageInfo {
            id: self.id,
            content: self.content.clone(),
            sender_id: self.sender_id.clone(),
            sender_name: self.sender_name.clone(),
            sent_at: self.created_at,
        }
    }
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chatroom_id: Uuid,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
}

impl SendMessageRequest {
    /// Plain text request
    pub fn text(chatroom_id: Uuid, sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chatroom_id,
            sender_id: sender_id.into(),
            sender_name: None,
            message_type: MessageType::Text,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// Validate sender and content before anything is persisted
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.sender_id.trim().is_empty() {
            return Err(SharedError::validation("senderId", "Sender id cannot be empty"));
        }
        if self.message_type == MessageType::Text && self.content.trim().is_empty() {
            return Err(SharedError::validation("content", "Message content cannot be empty"));
        }
        if self.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(SharedError::validation(
                "content",
                format!("Message content exceeds {} characters", MAX_CONTENT_LENGTH),
            ));
        }
        Ok(())
    }
}

/// Page of messages, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    pub page: u32,
    pub size: u32,
    pub has_more: bool,
}
