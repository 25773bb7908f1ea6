/**
 * Real-time Event System
 *
 * Every broadcast in the chat core is a `RealtimeEvent` published on a named
 * topic. Topic names are part of the client contract:
 *
 * - `presence`              - online/offline transitions
 * - `room.<id>`             - new messages in a room
 * - `room.<id>.delete`      - soft-deleted messages
 * - `room.<id>.read`        - read-status updates
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::chat::{ChatMessage, ReadStatusEvent, UserStatusMessage};
use crate::shared::error::SharedError;

/// Topic name helpers
pub mod topics {
    use uuid::Uuid;

    /// Global presence topic
    pub const PRESENCE: &str = "presence";

    /// New-message topic of a room
    pub fn room(chatroom_id: Uuid) -> String {
        format!("room.{}", chatroom_id)
    }

    /// Message-deleted topic of a room
    pub fn room_delete(chatroom_id: Uuid) -> String {
        format!("room.{}.delete", chatroom_id)
    }

    /// Read-status topic of a room
    pub fn room_read(chatroom_id: Uuid) -> String {
        format!("room.{}.read", chatroom_id)
    }

    /// Room id encoded in a room topic, if any
    pub fn parse_room(topic: &str) -> Option<Uuid> {
        let rest = topic.strip_prefix("room.")?;
        let id = rest.split('.').next()?;
        Uuid::parse_str(id).ok()
    }
}

/// Type of real-time event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new chat message
    Message,
    /// A message was soft-deleted
    MessageDeleted,
    /// A participant's read pointer moved
    ReadStatus,
    /// A user went online or offline
    Presence,
}

/// Real-time event that can be broadcast to all subscribers of a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    /// Topic the event is published on
    pub topic: String,
    /// Type of event
    pub event_type: EventType,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// When the event was created
    pub timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(topic: impl Into<String>, event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// New message on `room.<id>`
    pub fn message(message: &ChatMessage) -> Result<Self, SharedError> {
        Ok(Self::new(
            topics::room(message.chatroom_id),
            EventType::Message,
            serde_json::to_value(message)?,
        ))
    }

    /// Deletion notice on `room.<id>.delete`
    pub fn message_deleted(chatroom_id: Uuid, message_id: Uuid) -> Self {
        Self::new(
            topics::room_delete(chatroom_id),
            EventType::MessageDeleted,
            serde_json::json!({
                "chatroomId": chatroom_id,
                "messageId": message_id,
            }),
        )
    }

    /// Read pointer update on `room.<id>.read`
    pub fn read_status(status: &ReadStatusEvent) -> Result<Self, SharedError> {
        Ok(Self::new(
            topics::room_read(status.chatroom_id),
            EventType::ReadStatus,
            serde_json::to_value(status)?,
        ))
    }

    /// Presence transition on `presence`
    pub fn presence(status: &UserStatusMessage) -> Result<Self, SharedError> {
        Ok(Self::new(
            topics::PRESENCE,
            EventType::Presence,
            serde_json::to_value(status)?,
        ))
    }
}
