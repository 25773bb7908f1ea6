/**
 * Room Service
 *
 * Room lifecycle and membership. Rooms are soft-deleted, never removed;
 * participants likewise. A team has at most one default room and a user at
 * most one AI room per team: both creation paths are get-or-create and
 * resolve a concurrent insert through the store's conflict error.
 */

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::auth::UserDirectory;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::receipts::ReadReceiptTracker;
use crate::backend::store::{ChatStore, StoreError};
use crate::shared::chat::{
    ChatRoom, ChatRoomSummary, ChatRoomType, CreateChatRoomRequest, NotificationSetting, RoomReadSummary,
};

#[derive(Clone)]
pub struct RoomService {
    store: Arc<dyn ChatStore>,
    directory: Arc<dyn UserDirectory>,
    receipts: ReadReceiptTracker,
}

impl RoomService {
    pub fn new(store: Arc<dyn ChatStore>, directory: Arc<dyn UserDirectory>, receipts: ReadReceiptTracker) -> Self {
        Self {
            store,
            directory,
            receipts,
        }
    }

    /// Live room by id
    pub async fn get_room(&self, chatroom_id: Uuid) -> BackendResult<ChatRoom> {
        self.store
            .find_room(chatroom_id)
            .await?
            .filter(|room| !room.is_deleted())
            .ok_or_else(|| BackendError::room_not_found(chatroom_id))
    }

    /// Live room the user actively participates in
    pub async fn member_room(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<ChatRoom> {
        let room = self.get_room(chatroom_id).await?;
        if !room.is_active_participant(user_id) {
            return Err(BackendError::access_denied(format!(
                "user {} is not a participant of chat room {}",
                user_id, chatroom_id
            )));
        }
        Ok(room)
    }

    /// Create a room with the creator and the requested participants
    pub async fn create_room(&self, creator: &str, request: CreateChatRoomRequest) -> BackendResult<ChatRoom> {
        if request.name.trim().is_empty() {
            return Err(BackendError::validation("room name cannot be empty"));
        }
        if request.room_type == ChatRoomType::Ai {
            return self
                .create_or_get_ai_room(request.team_id.as_deref(), creator, &request.name)
                .await;
        }

        let mut room = ChatRoom::new(request.team_id, request.name.trim(), request.room_type);
        room.add_participant(creator);
        for user_id in request.participant_ids.iter().filter(|id| !id.trim().is_empty()) {
            room.add_participant(user_id);
        }
        self.store.insert_room(&room).await?;
        info!(
            "[Rooms] Created {} room {} with {} participants",
            room.room_type.as_str(),
            room.id,
            room.participants.len()
        );
        Ok(room)
    }

    /// The team's default room, created with every team member on first use
    pub async fn create_default_room(&self, team_id: &str, name: &str, creator: &str) -> BackendResult<ChatRoom> {
        if let Some(existing) = self.store.find_default_team_room(team_id).await? {
            debug!("[Rooms] Team {} already has default room {}", team_id, existing.id);
            return Ok(existing);
        }

        let mut room = ChatRoom::new(Some(team_id.to_string()), name, ChatRoomType::Team);
        room.is_default = true;
        room.add_participant(creator);
        match self.directory.team_members(team_id).await {
            Ok(members) => {
                for member in members {
                    room.add_participant(&member.user_id);
                }
            }
            Err(e) => warn!("[Rooms] Could not list members of team {}: {}", team_id, e),
        }

        match self.store.insert_room(&room).await {
            Ok(()) => {
                info!("[Rooms] Created default room {} for team {}", room.id, team_id);
                Ok(room)
            }
            Err(StoreError::Conflict(reason)) => {
                debug!("[Rooms] Default room race for team {}: {}", team_id, reason);
                self.store
                    .find_default_team_room(team_id)
                    .await?
                    .ok_or_else(|| BackendError::room_not_found(format!("default room of team {}", team_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The user's personal AI room in a team, created on first use
    pub async fn create_or_get_ai_room(&self, team_id: Option<&str>, user_id: &str, name: &str) -> BackendResult<ChatRoom> {
        if let Some(existing) = self.store.find_ai_room(team_id, user_id).await? {
            return Ok(existing);
        }

        let name = if name.trim().is_empty() { "AI Assistant" } else { name.trim() };
        let mut room = ChatRoom::new(team_id.map(str::to_string), name, ChatRoomType::Ai);
        room.owner_id = Some(user_id.to_string());
        room.add_participant(user_id);

        match self.store.insert_room(&room).await {
            Ok(()) => {
                info!("[Rooms] Created AI room {} for {}", room.id, user_id);
                Ok(room)
            }
            Err(StoreError::Conflict(_)) => self
                .store
                .find_ai_room(team_id, user_id)
                .await?
                .ok_or_else(|| BackendError::room_not_found(format!("AI room of {}", user_id))),
            Err(e) => Err(e.into()),
        }
    }

    /// Soft-delete a room. Only active participants may do so.
    pub async fn delete_room(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<()> {
        self.member_room(chatroom_id, user_id).await?;
        if !self.store.soft_delete_room(chatroom_id, Utc::now()).await? {
            return Err(BackendError::room_not_found(chatroom_id));
        }
        info!("[Rooms] Room {} deleted by {}", chatroom_id, user_id);
        Ok(())
    }

    /// Add (or re-activate) a participant
    pub async fn add_participant(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<ChatRoom> {
        self.get_room(chatroom_id).await?;
        if self.store.add_participant(chatroom_id, user_id, Utc::now()).await? {
            info!("[Rooms] {} joined {}", user_id, chatroom_id);
        }
        self.get_room(chatroom_id).await
    }

    /// Soft-delete a participant and drop their receipts in the room
    pub async fn remove_participant(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<ChatRoom> {
        self.get_room(chatroom_id).await?;
        if !self.store.remove_participant(chatroom_id, user_id, Utc::now()).await? {
            return Err(BackendError::not_found("participant", user_id));
        }
        self.receipts.delete_user_receipts(chatroom_id, user_id).await?;
        info!("[Rooms] {} left {}", user_id, chatroom_id);
        self.get_room(chatroom_id).await
    }

    /// Flip a participant's notification flag, returning the new setting
    pub async fn toggle_notification(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<NotificationSetting> {
        let room = self.get_room(chatroom_id).await?;
        let enabled = self
            .store
            .toggle_participant_notification(chatroom_id, user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("participant", user_id))?;
        debug!("[Rooms] Notifications of {} in {} now {}", user_id, chatroom_id, enabled);
        Ok(NotificationSetting {
            chatroom_id,
            name: room.name,
            notification_enabled: enabled,
        })
    }

    pub async fn notification_setting(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<NotificationSetting> {
        let room = self.member_room(chatroom_id, user_id).await?;
        let enabled = room
            .participant(user_id)
            .map(|p| p.notification_enabled)
            .unwrap_or(true);
        Ok(NotificationSetting {
            chatroom_id,
            name: room.name,
            notification_enabled: enabled,
        })
    }

    /// Notification settings of every live room the user is in
    pub async fn notification_settings(&self, user_id: &str) -> BackendResult<Vec<NotificationSetting>> {
        let rooms = self.store.rooms_for_user(user_id, None).await?;
        Ok(rooms
            .into_iter()
            .map(|room| NotificationSetting {
                chatroom_id: room.id,
                notification_enabled: room
                    .participant(user_id)
                    .map(|p| p.notification_enabled)
                    .unwrap_or(true),
                name: room.name,
            })
            .collect())
    }

    /// Rooms of a user with their unread counts
    pub async fn rooms_for_user(&self, user_id: &str, team_id: Option<&str>) -> BackendResult<Vec<ChatRoomSummary>> {
        let rooms = self.store.rooms_for_user(user_id, team_id).await?;
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let unread_count = match self.receipts.unread_count(room.id, user_id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("[Rooms] Unread count of {} in {} failed: {}", user_id, room.id, e);
                    0
                }
            };
            summaries.push(ChatRoomSummary { room, unread_count });
        }
        Ok(summaries)
    }

    pub async fn read_summary(&self, chatroom_id: Uuid) -> BackendResult<RoomReadSummary> {
        let room = self.get_room(chatroom_id).await?;
        Ok(RoomReadSummary::from_room(&room))
    }
}
