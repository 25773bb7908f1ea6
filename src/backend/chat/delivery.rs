/**
 * Message Delivery Service
 *
 * Accepts, authorizes, persists and fans out chat messages.
 *
 * # Send path
 *
 * 1. Validate the request and resolve the room (`NotFound` if missing or deleted)
 * 2. Authorize: the sender must be an active participant. The AI identity
 *    sending into an AI or team room skips the check.
 * 3. Resolve a missing sender name through the user directory
 * 4. Persist with a fresh id and a UTC timestamp
 * 5. Update the room's last-message summary
 * 6. Publish on `room.<id>`
 * 7. Mirror into the bounded recent-message cache
 * 8. Hand the message to the analysis trigger off the hot path
 *
 * Only steps 1-4 can fail the send. Everything after persistence is logged
 * and swallowed.
 */

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::analysis::AnalysisTrigger;
use crate::backend::auth::UserDirectory;
use crate::backend::cache::EphemeralCache;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::RealtimeHub;
use crate::backend::store::ChatStore;
use crate::shared::chat::{ChatMessage, ChatRoom, ChatRoomType, MessagePage, MessageType, SendMessageRequest};
use crate::shared::{ChatConfig, RealtimeEvent};

/// Largest page the history endpoints hand out
pub const MAX_PAGE_SIZE: u32 = 100;

/// A persisted message together with its room as it looked after the send
#[derive(Debug, Clone)]
pub struct Delivered {
    pub message: ChatMessage,
    pub room: ChatRoom,
}

#[derive(Clone)]
pub struct MessageDeliveryService {
    store: Arc<dyn ChatStore>,
    cache: Arc<dyn EphemeralCache>,
    hub: RealtimeHub,
    directory: Arc<dyn UserDirectory>,
    trigger: Option<AnalysisTrigger>,
    config: Arc<ChatConfig>,
}

impl MessageDeliveryService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        cache: Arc<dyn EphemeralCache>,
        hub: RealtimeHub,
        directory: Arc<dyn UserDirectory>,
        config: Arc<ChatConfig>,
    ) -> Self {
        Self {
            store,
            cache,
            hub,
            directory,
            trigger: None,
            config,
        }
    }

    /// Run the analysis trigger for every delivered message
    pub fn with_analysis(mut self, trigger: AnalysisTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn live_room(&self, chatroom_id: Uuid) -> BackendResult<ChatRoom> {
        self.store
            .find_room(chatroom_id)
            .await?
            .filter(|room| !room.is_deleted())
            .ok_or_else(|| BackendError::room_not_found(chatroom_id))
    }

    pub async fn send(&self, request: SendMessageRequest) -> BackendResult<Delivered> {
        request.validate()?;
        let mut room = self.live_room(request.chatroom_id).await?;

        let ai_bypass = self.config.is_ai_sender(&request.sender_id)
            && matches!(room.room_type, ChatRoomType::Ai | ChatRoomType::Team);
        if !ai_bypass && !room.is_active_participant(&request.sender_id) {
            warn!(
                "[Delivery] {} is not a participant of {}",
                request.sender_id, room.id
            );
            return Err(BackendError::access_denied(format!(
                "user {} is not a participant of chat room {}",
                request.sender_id, room.id
            )));
        }

        let sender_name = self.resolve_sender_name(&request).await;
        let mut message = ChatMessage::from_request(&request);
        message.sender_name = Some(sender_name);

        self.store.insert_message(&message).await?;
        info!(
            "[Delivery] {} -> room {} ({}): {}",
            message.sender_id,
            room.id,
            message.id,
            message.preview(20)
        );

        let summary = message.to_last_message_info();
        if let Err(e) = self.store.update_last_message(room.id, &summary).await {
            error!("[Delivery] Failed to update last message of {}: {}", room.id, e);
        }
        room.update_last_message(summary);

        match RealtimeEvent::message(&message) {
            Ok(event) => {
                let receivers = self.hub.publish(event);
                debug!("[Delivery] Message {} delivered to {} subscribers", message.id, receivers);
            }
            Err(e) => warn!("[Delivery] Failed to build event for {}: {}", message.id, e),
        }

        self.mirror_to_cache(&message).await;

        if let Some(trigger) = &self.trigger {
            let trigger = trigger.clone();
            let delivered = message.clone();
            tokio::spawn(async move {
                trigger.on_message(&delivered).await;
            });
        }

        Ok(Delivered { message, room })
    }

    async fn mirror_to_cache(&self, message: &ChatMessage) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[Delivery] Failed to serialize message {} for cache: {}", message.id, e);
                return;
            }
        };
        match self
            .cache
            .push_recent_message(
                message.chatroom_id,
                message.score(),
                &payload,
                self.config.recent_message_capacity,
            )
            .await
        {
            Ok(size) => debug!("[Delivery] Recent cache of {} holds {}", message.chatroom_id, size),
            Err(e) => warn!("[Delivery] Failed to cache message {}: {}", message.id, e),
        }
    }

    /// Sender name for a request: the given one, the directory's, or the unknown-user fallback
    async fn resolve_sender_name(&self, request: &SendMessageRequest) -> String {
        let given = request
            .sender_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != self.config.unknown_sender_name);
        if let Some(name) = given {
            return name.to_string();
        }
        if self.config.is_ai_sender(&request.sender_id) {
            return self.config.ai_sender_name.clone();
        }

        match self.directory.display_name(&request.sender_id).await {
            Ok(Some(name)) => {
                debug!("[Delivery] Resolved sender {} as {}", request.sender_id, name);
                name
            }
            Ok(None) => {
                warn!("[Delivery] Unknown sender {}", request.sender_id);
                self.config.unknown_sender_name.clone()
            }
            Err(e) => {
                warn!("[Delivery] Sender lookup failed for {}: {}", request.sender_id, e);
                self.config.unknown_sender_name.clone()
            }
        }
    }

    /// Post as the AI identity
    pub async fn send_as_ai(
        &self,
        chatroom_id: Uuid,
        content: impl Into<String>,
        message_type: MessageType,
    ) -> BackendResult<Delivered> {
        let request = SendMessageRequest::text(chatroom_id, self.config.ai_sender_id.clone(), content)
            .with_sender_name(self.config.ai_sender_name.clone())
            .with_type(message_type);
        self.send(request).await
    }

    /// Announce a roulette result in the team's default room
    pub async fn send_roulette_result(&self, team_id: &str, result: &str) -> BackendResult<Delivered> {
        let room = self
            .store
            .find_default_team_room(team_id)
            .await?
            .ok_or_else(|| BackendError::not_found("default chat room of team", team_id))?;
        self.send_as_ai(room.id, format!("🎲 Roulette result: {}", result), MessageType::System)
            .await
    }

    /// Soft-delete a message. Only its sender may do so.
    pub async fn delete(&self, message_id: Uuid, user_id: &str) -> BackendResult<ChatMessage> {
        let mut message = self
            .store
            .find_message(message_id)
            .await?
            .ok_or_else(|| BackendError::message_not_found(message_id))?;

        if message.sender_id != user_id {
            warn!("[Delivery] {} tried to delete message {} of {}", user_id, message_id, message.sender_id);
            return Err(BackendError::access_denied("only the sender can delete a message"));
        }

        let deleted_at = message.deleted_at.unwrap_or_else(Utc::now);
        self.store.soft_delete_message(message_id, deleted_at).await?;
        message.deleted_at = Some(deleted_at);

        self.hub
            .publish(RealtimeEvent::message_deleted(message.chatroom_id, message.id));
        info!("[Delivery] Message {} deleted by {}", message_id, user_id);
        Ok(message)
    }

    pub async fn get_message(&self, message_id: Uuid) -> BackendResult<ChatMessage> {
        self.store
            .find_message(message_id)
            .await?
            .ok_or_else(|| BackendError::message_not_found(message_id))
    }

    /// Zero-based page of live messages, newest first
    pub async fn page(&self, chatroom_id: Uuid, page: u32, size: u32) -> BackendResult<MessagePage> {
        self.live_room(chatroom_id).await?;
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let offset = u64::from(page) * u64::from(size);

        let mut messages = self
            .store
            .page_messages(chatroom_id, offset, u64::from(size) + 1)
            .await?;
        let has_more = messages.len() > size as usize;
        messages.truncate(size as usize);

        Ok(MessagePage {
            messages,
            page,
            size,
            has_more,
        })
    }

    async fn anchor(&self, chatroom_id: Uuid, message_id: Uuid) -> BackendResult<ChatMessage> {
        self.live_room(chatroom_id).await?;
        self.store
            .find_message(message_id)
            .await?
            .filter(|anchor| anchor.chatroom_id == chatroom_id)
            .ok_or_else(|| BackendError::message_not_found(message_id))
    }

    /// Live messages older than the anchor, newest first
    pub async fn messages_before(&self, chatroom_id: Uuid, message_id: Uuid, limit: u32) -> BackendResult<Vec<ChatMessage>> {
        let anchor = self.anchor(chatroom_id, message_id).await?;
        let limit = u64::from(limit.clamp(1, MAX_PAGE_SIZE));
        Ok(self
            .store
            .messages_before(chatroom_id, anchor.created_at, limit)
            .await?)
    }

    /// Live messages newer than the anchor, oldest first
    pub async fn messages_after(&self, chatroom_id: Uuid, message_id: Uuid, limit: u32) -> BackendResult<Vec<ChatMessage>> {
        let anchor = self.anchor(chatroom_id, message_id).await?;
        let limit = u64::from(limit.clamp(1, MAX_PAGE_SIZE));
        Ok(self
            .store
            .messages_after(chatroom_id, anchor.created_at, limit)
            .await?)
    }

    /// Contents of the recent-message cache, oldest first. Corrupt entries are skipped.
    pub async fn recent_cached(&self, chatroom_id: Uuid) -> BackendResult<Vec<ChatMessage>> {
        let entries = self.cache.recent_messages(chatroom_id).await?;
        Ok(entries
            .iter()
            .filter_map(|entry| match serde_json::from_str::<ChatMessage>(entry) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("[Delivery] Skipping corrupt cache entry in {}: {}", chatroom_id, e);
                    None
                }
            })
            .collect())
    }
}
