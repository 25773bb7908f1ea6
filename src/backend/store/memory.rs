//! In-memory durable store
//!
//! Used when no `DATABASE_URL` is configured and as the test backend. Data
//! lives for the life of the process. Messages keep insertion order, which
//! breaks timestamp ties the same way a database sequence would.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageStore, ReceiptStore, RoomStore, StoreError, StoreResult};
use crate::shared::chat::{ChatMessage, ChatRoom, ChatRoomType, LastMessageInfo, ReadReceipt};

#[derive(Debug, Default)]
struct MemoryData {
    rooms: HashMap<Uuid, ChatRoom>,
    messages: Vec<ChatMessage>,
    receipts: HashMap<(Uuid, String), ReadReceipt>,
}

impl MemoryData {
    fn live_messages(&self, chatroom_id: Uuid) -> impl Iterator<Item = &ChatMessage> + '_ {
        self.messages
            .iter()
            .filter(move |m| m.chatroom_id == chatroom_id && !m.is_deleted())
    }

    fn conflicts_with(&self, room: &ChatRoom) -> Option<String> {
        self.rooms.values().filter(|r| !r.is_deleted()).find_map(|existing| {
            let same_team = existing.team_id == room.team_id;
            if room.is_default && existing.is_default && same_team {
                Some(format!("team {:?} already has a default room", room.team_id))
            } else if room.room_type == ChatRoomType::Ai
                && existing.room_type == ChatRoomType::Ai
                && same_team
                && existing.owner_id == room.owner_id
            {
                Some(format!("user {:?} already has an AI room", room.owner_id))
            } else {
                None
            }
        })
    }
}

/// Sort newest first by timestamp, later insertions first on ties
fn newest_first(mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    messages.reverse();
    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    messages
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn insert_room(&self, room: &ChatRoom) -> StoreResult<()> {
        let mut data = self.data.write().await;
        if let Some(conflict) = data.conflicts_with(room) {
            return Err(StoreError::Conflict(conflict));
        }
        data.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn find_room(&self, id: Uuid) -> StoreResult<Option<ChatRoom>> {
        Ok(self.data.read().await.rooms.get(&id).cloned())
    }

    async fn soft_delete_room(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        match data.rooms.get_mut(&id) {
            Some(room) if !room.is_deleted() => {
                room.deleted_at = Some(deleted_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_participant(&self, chatroom_id: Uuid, user_id: &str, joined_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let Some(room) = data.rooms.get_mut(&chatroom_id) else {
            return Ok(false);
        };
        if !room.add_participant(user_id) {
            return Ok(false);
        }
        if let Some(participant) = room.participants.iter_mut().find(|p| p.user_id == user_id) {
            participant.joined_at = joined_at;
        }
        Ok(true)
    }

    async fn remove_participant(&self, chatroom_id: Uuid, user_id: &str, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let Some(participant) = data
            .rooms
            .get_mut(&chatroom_id)
            .and_then(|room| room.participants.iter_mut().find(|p| p.user_id == user_id && p.is_active()))
        else {
            return Ok(false);
        };
        participant.deleted_at = Some(deleted_at);
        Ok(true)
    }

    async fn toggle_participant_notification(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<Option<bool>> {
        Ok(self
            .data
            .write()
            .await
            .rooms
            .get_mut(&chatroom_id)
            .and_then(|room| room.toggle_notification(user_id)))
    }

    async fn find_default_team_room(&self, team_id: &str) -> StoreResult<Option<ChatRoom>> {
        Ok(self
            .data
            .read()
            .await
            .rooms
            .values()
            .find(|r| !r.is_deleted() && r.is_default && r.team_id.as_deref() == Some(team_id))
            .cloned())
    }

    async fn find_ai_room(&self, team_id: Option<&str>, owner_id: &str) -> StoreResult<Option<ChatRoom>> {
        Ok(self
            .data
            .read()
            .await
            .rooms
            .values()
            .find(|r| {
                !r.is_deleted()
                    && r.room_type == ChatRoomType::Ai
                    && r.team_id.as_deref() == team_id
                    && r.owner_id.as_deref() == Some(owner_id)
            })
            .cloned())
    }

    async fn rooms_for_user(&self, user_id: &str, team_id: Option<&str>) -> StoreResult<Vec<ChatRoom>> {
        let data = self.data.read().await;
        let mut rooms: Vec<ChatRoom> = data
            .rooms
            .values()
            .filter(|r| !r.is_deleted() && r.is_active_participant(user_id))
            .filter(|r| team_id.is_none() || r.team_id.as_deref() == team_id)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| {
            let a_time = a.last_message.as_ref().map_or(a.created_at, |m| m.sent_at);
            let b_time = b.last_message.as_ref().map_or(b.created_at, |m| m.sent_at);
            b_time.cmp(&a_time)
        });
        Ok(rooms)
    }

    async fn update_last_message(&self, chatroom_id: Uuid, info: &LastMessageInfo) -> StoreResult<()> {
        if let Some(room) = self.data.write().await.rooms.get_mut(&chatroom_id) {
            room.update_last_message(info.clone());
        }
        Ok(())
    }

    async fn update_participant_last_read(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        message_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self
            .data
            .write()
            .await
            .rooms
            .get_mut(&chatroom_id)
            .is_some_and(|room| room.update_last_read(user_id, message_id)))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.data.write().await.messages.push(message.clone());
        Ok(())
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>> {
        Ok(self
            .data
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn soft_delete_message(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        match data.messages.iter_mut().find(|m| m.id == id && !m.is_deleted()) {
            Some(message) => {
                message.deleted_at = Some(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn latest_message(&self, chatroom_id: Uuid) -> StoreResult<Option<ChatMessage>> {
        let data = self.data.read().await;
        let live: Vec<ChatMessage> = data.live_messages(chatroom_id).cloned().collect();
        Ok(newest_first(live).into_iter().next())
    }

    async fn page_messages(&self, chatroom_id: Uuid, offset: u64, limit: u64) -> StoreResult<Vec<ChatMessage>> {
        let data = self.data.read().await;
        let live: Vec<ChatMessage> = data.live_messages(chatroom_id).cloned().collect();
        Ok(newest_first(live)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn messages_before(
        &self,
        chatroom_id: Uuid,
        before: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let data = self.data.read().await;
        let older: Vec<ChatMessage> = data
            .live_messages(chatroom_id)
            .filter(|m| m.created_at < before)
            .cloned()
            .collect();
        Ok(newest_first(older).into_iter().take(limit as usize).collect())
    }

    async fn messages_after(
        &self,
        chatroom_id: Uuid,
        after: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let data = self.data.read().await;
        let mut newer: Vec<ChatMessage> = data
            .live_messages(chatroom_id)
            .filter(|m| m.created_at > after)
            .cloned()
            .collect();
        newer.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        newer.truncate(limit as usize);
        Ok(newer)
    }

    async fn count_messages_after(&self, chatroom_id: Uuid, after: Option<DateTime<Utc>>) -> StoreResult<u64> {
        let data = self.data.read().await;
        let count = data
            .live_messages(chatroom_id)
            .filter(|m| after.map_or(true, |after| m.created_at > after))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn find_receipt(&self, message_id: Uuid, user_id: &str) -> StoreResult<Option<ReadReceipt>> {
        Ok(self
            .data
            .read()
            .await
            .receipts
            .get(&(message_id, user_id.to_string()))
            .cloned())
    }

    async fn insert_receipt(&self, receipt: &ReadReceipt) -> StoreResult<ReadReceipt> {
        let mut data = self.data.write().await;
        let stored = data
            .receipts
            .entry((receipt.message_id, receipt.user_id.clone()))
            .or_insert_with(|| receipt.clone());
        Ok(stored.clone())
    }

    async fn receipts_for_message(&self, message_id: Uuid) -> StoreResult<Vec<ReadReceipt>> {
        let data = self.data.read().await;
        let mut receipts: Vec<ReadReceipt> = data
            .receipts
            .values()
            .filter(|r| r.message_id == message_id)
            .cloned()
            .collect();
        receipts.sort_by(|a, b| a.read_at.cmp(&b.read_at));
        Ok(receipts)
    }

    async fn last_read_at(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .data
            .read()
            .await
            .receipts
            .values()
            .filter(|r| r.chatroom_id == chatroom_id && r.user_id == user_id && r.read_at >= since)
            .map(|r| r.read_at)
            .max())
    }

    async fn delete_user_receipts(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<u64> {
        let mut data = self.data.write().await;
        let before = data.receipts.len();
        data.receipts
            .retain(|_, r| !(r.chatroom_id == chatroom_id && r.user_id == user_id));
        Ok((before - data.receipts.len()) as u64)
    }
}
