//! Chat Room Data Structure
//!
//! A room owns its participant list and a denormalized summary of its most
//! recent message. Rooms and participants are soft-deleted, never removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Kind of chat room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRoomType {
    /// One-to-one conversation
    Direct,
    /// Team-wide room; at most one per team is flagged default
    Team,
    /// Personal assistant room; unique per (team, user)
    Ai,
}

impl ChatRoomType {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRoomType::Direct => "DIRECT",
            ChatRoomType::Team => "TEAM",
            ChatRoomType::Ai => "AI",
        }
    }

    /// Parse from the stored representation
    pub fn parse(value: &str) -> Result<Self, SharedError> {
        match value {
            "DIRECT" => Ok(ChatRoomType::Direct),
            "TEAM" => Ok(ChatRoomType::Team),
            "AI" => Ok(ChatRoomType::Ai),
            other => Err(SharedError::unknown_variant("room type", other)),
        }
    }
}

/// Membership entry of a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub notification_enabled: bool,
    /// Pointer used as the last-resort read state
    pub last_read_message_id: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            notification_enabled: true,
            last_read_message_id: None,
            joined_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Denormalized summary of the latest message in a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageInfo {
    pub id: Uuid,
    pub content: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// A chat room and its membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: Uuid,
    pub team_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: ChatRoomType,
    pub is_default: bool,
    /// Owner of a personal AI room; `None` for every other room type
    pub owner_id: Option<String>,
    pub participants: Vec<Participant>,
    pub last_message: Option<LastMessageInfo>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ChatRoom {
    /// Create a new, empty room
    pub fn new(team_id: Option<String>, name: impl Into<String>, room_type: ChatRoomType) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            name: name.into(),
            room_type,
            is_default: false,
            owner_id: None,
            participants: Vec::new(),
            last_message: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(Utc::now());
        }
    }

    /// Participants that have not left the room
    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_active())
    }

    pub fn is_active_participant(&self, user_id: &str) -> bool {
        self.active_participants().any(|p| p.user_id == user_id)
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    /// Add a participant, re-activating a soft-deleted entry if present.
    ///
    /// Returns `false` when the user was already an active participant.
    pub fn add_participant(&mut self, user_id: &str) -> bool {
        match self.participant_mut(user_id) {
            Some(existing) if existing.is_active() => false,
            Some(existing) => {
                existing.deleted_at = None;
                existing.joined_at = Utc::now();
                true
            }
            None => {
                self.participants.push(Participant::new(user_id));
                true
            }
        }
    }

    /// Soft-delete a participant. Returns `false` when no active entry existed.
    pub fn remove_participant(&mut self, user_id: &str) -> bool {
        match self.participant_mut(user_id) {
            Some(existing) if existing.is_active() => {
                existing.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// Flip the notification flag of an active participant, returning the new value
    pub fn toggle_notification(&mut self, user_id: &str) -> Option<bool> {
        let participant = self.participant_mut(user_id).filter(|p| p.is_active())?;
        participant.notification_enabled = !participant.notification_enabled;
        Some(participant.notification_enabled)
    }

    /// Record the participant-level read pointer. Returns `false` if the user is not a member.
    pub fn update_last_read(&mut self, user_id: &str, message_id: Uuid) -> bool {
        match self.participant_mut(user_id).filter(|p| p.is_active()) {
            Some(participant) => {
                participant.last_read_message_id = Some(message_id);
                true
            }
            None => false,
        }
    }

    pub fn update_last_message(&mut self, info: LastMessageInfo) {
        self.last_message = Some(info);
    }
}

/// Request to create a room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRoomRequest {
    pub team_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: ChatRoomType,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

/// Room listing entry with the caller's unread count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomSummary {
    #[serde(flatten)]
    pub room: ChatRoom,
    pub unread_count: u64,
}

/// Per-room notification preference of one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSetting {
    pub chatroom_id: Uuid,
    pub name: String,
    pub notification_enabled: bool,
}

/// Read summary of a room's latest message across its participants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomReadSummary {
    pub last_message_id: Option<Uuid>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub read_by_all: bool,
    pub read_count: usize,
    pub total_participants: usize,
    pub unread_user_ids: Vec<String>,
}

impl RoomReadSummary {
    /// Build the summary from participant-level read pointers
    pub fn from_room(room: &ChatRoom) -> Self {
        let last_id = room.last_message.as_ref().map(|m| m.id);
        let active: Vec<&Participant> = room.active_participants().collect();
        let unread_user_ids: Vec<String> = active
            .iter()
            .filter(|p| match (p.last_read_message_id, last_id) {
                (None, _) => true,
                (Some(read), Some(last)) => read != last,
                (Some(_), None) => false,
            })
            .map(|p| p.user_id.clone())
            .collect();

        Self {
            last_message_id: last_id,
            last_message_time: room.last_message.as_ref().map(|m| m.sent_at),
            read_by_all: unread_user_ids.is_empty(),
            read_count: active.len() - unread_user_ids.len(),
            total_participants: active.len(),
            unread_user_ids,
        }
    }
}
