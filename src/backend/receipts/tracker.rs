/**
 * Read-Receipt Tracker
 *
 * Records that a user has seen a message and answers unread-count queries.
 *
 * Read state per (room, user) only moves forward: unread -> read.
 *
 * # Write chain
 *
 * `mark_read` writes read state along three independent paths:
 *
 * 1. the durable receipt store (authoritative, first write wins)
 * 2. the cache's per-room last-read pointer (always attempted)
 * 3. the participant's `lastReadMessageId` on the room, as a last resort
 *    when the durable write failed
 *
 * After a durable success the participant pointer is also moved
 * opportunistically so the room read summary stays current. The caller
 * only sees an error when every attempted path failed.
 */

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::cache::EphemeralCache;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::RealtimeHub;
use crate::backend::store::ChatStore;
use crate::shared::chat::{MessageReadStatus, ReadReceipt, ReadStatusEvent};
use crate::shared::RealtimeEvent;

#[derive(Clone)]
pub struct ReadReceiptTracker {
    store: Arc<dyn ChatStore>,
    cache: Arc<dyn EphemeralCache>,
    hub: RealtimeHub,
    read_lookback: Duration,
}

impl ReadReceiptTracker {
    pub fn new(
        store: Arc<dyn ChatStore>,
        cache: Arc<dyn EphemeralCache>,
        hub: RealtimeHub,
        read_lookback: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            hub,
            read_lookback,
        }
    }

    /// Mark one message as read by `user_id`.
    ///
    /// An existing receipt is returned unchanged and nothing else is written.
    /// A message that does not belong to the room is `NotFound`; if the
    /// store cannot be asked, the write chain runs anyway.
    pub async fn mark_read(&self, chatroom_id: Uuid, message_id: Uuid, user_id: &str) -> BackendResult<ReadReceipt> {
        debug!(
            "[Receipts] mark_read room={} message={} user={}",
            chatroom_id, message_id, user_id
        );

        match self.store.find_message(message_id).await {
            Ok(Some(message)) if message.chatroom_id == chatroom_id => {}
            Ok(_) => return Err(BackendError::message_not_found(message_id)),
            Err(e) => warn!("[Receipts] Could not look up message {}: {}", message_id, e),
        }

        let durable = match self.store.find_receipt(message_id, user_id).await {
            Ok(Some(existing)) => {
                debug!("[Receipts] Message {} already read by {}", message_id, user_id);
                return Ok(existing);
            }
            Ok(None) => {
                let candidate = ReadReceipt::new(chatroom_id, message_id, user_id);
                self.store.insert_receipt(&candidate).await
            }
            Err(e) => Err(e),
        };

        let cache_ok = match self.cache.set_last_read(chatroom_id, user_id, message_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("[Receipts] Cache mirror failed for room {} user {}: {}", chatroom_id, user_id, e);
                false
            }
        };

        let receipt = match durable {
            Ok(receipt) => {
                info!(
                    "[Receipts] Stored receipt room={} message={} user={}",
                    chatroom_id, message_id, user_id
                );
                match self
                    .store
                    .update_participant_last_read(chatroom_id, user_id, message_id)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => debug!("[Receipts] {} is not an active participant of {}", user_id, chatroom_id),
                    Err(e) => warn!("[Receipts] Participant pointer update failed: {}", e),
                }
                receipt
            }
            Err(durable_err) => {
                warn!("[Receipts] Durable receipt write failed: {}", durable_err);
                let participant_ok = match self
                    .store
                    .update_participant_last_read(chatroom_id, user_id, message_id)
                    .await
                {
                    Ok(updated) => updated,
                    Err(e) => {
                        warn!("[Receipts] Participant fallback failed: {}", e);
                        false
                    }
                };

                if !cache_ok && !participant_ok {
                    error!(
                        "[Receipts] Every read-state path failed for room={} message={} user={}",
                        chatroom_id, message_id, user_id
                    );
                    return Err(BackendError::full_failure(format!(
                        "could not record read state of message {}",
                        message_id
                    )));
                }
                ReadReceipt::new(chatroom_id, message_id, user_id)
            }
        };

        self.publish_read_status(chatroom_id, user_id, message_id);
        Ok(receipt)
    }

    /// Mark the newest message of a room as read. `None` when the room has no messages.
    pub async fn mark_all_read(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<Option<ReadReceipt>> {
        match self.store.latest_message(chatroom_id).await? {
            Some(latest) => {
                let receipt = self.mark_read(chatroom_id, latest.id, user_id).await?;
                info!("[Receipts] Room {} read up to {} by {}", chatroom_id, latest.id, user_id);
                Ok(Some(receipt))
            }
            None => {
                debug!("[Receipts] Room {} has no messages", chatroom_id);
                Ok(None)
            }
        }
    }

    /// Latest receipt time of a user in a room within the lookback window.
    ///
    /// Lookup failures read as "never read".
    pub async fn last_read_time(&self, chatroom_id: Uuid, user_id: &str) -> Option<DateTime<Utc>> {
        let since = chrono::Duration::from_std(self.read_lookback)
            .ok()
            .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.store.last_read_at(chatroom_id, user_id, since).await {
            Ok(time) => time,
            Err(e) => {
                warn!("[Receipts] Last read time lookup failed for {} in {}: {}", user_id, chatroom_id, e);
                None
            }
        }
    }

    /// Live messages created after the user's last read time (all of them if never read)
    pub async fn unread_count(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<u64> {
        let last_read = self.last_read_time(chatroom_id, user_id).await;
        let count = self.store.count_messages_after(chatroom_id, last_read).await?;
        debug!(
            "[Receipts] unread room={} user={} since={:?} count={}",
            chatroom_id, user_id, last_read, count
        );
        Ok(count)
    }

    pub async fn get_receipts(&self, message_id: Uuid) -> BackendResult<Vec<ReadReceipt>> {
        Ok(self.store.receipts_for_message(message_id).await?)
    }

    /// "Seen by" view of a message over the room's active participants
    pub async fn message_read_status(&self, chatroom_id: Uuid, message_id: Uuid) -> BackendResult<MessageReadStatus> {
        let room = self
            .store
            .find_room(chatroom_id)
            .await?
            .filter(|room| !room.is_deleted())
            .ok_or_else(|| BackendError::room_not_found(chatroom_id))?;

        self.store
            .find_message(message_id)
            .await?
            .filter(|message| message.chatroom_id == chatroom_id)
            .ok_or_else(|| BackendError::message_not_found(message_id))?;

        let participants: Vec<String> = room.active_participants().map(|p| p.user_id.clone()).collect();
        let receipts = self.store.receipts_for_message(message_id).await?;
        Ok(MessageReadStatus::build(message_id, &participants, &receipts))
    }

    /// Drop every receipt of a user in a room (participant removal)
    pub async fn delete_user_receipts(&self, chatroom_id: Uuid, user_id: &str) -> BackendResult<u64> {
        let removed = self.store.delete_user_receipts(chatroom_id, user_id).await?;
        info!("[Receipts] Removed {} receipts of {} in {}", removed, user_id, chatroom_id);
        Ok(removed)
    }

    fn publish_read_status(&self, chatroom_id: Uuid, user_id: &str, message_id: Uuid) {
        let status = ReadStatusEvent {
            chatroom_id,
            user_id: user_id.to_string(),
            last_read_message_id: message_id,
        };
        match RealtimeEvent::read_status(&status) {
            Ok(event) => {
                self.hub.publish(event);
            }
            Err(e) => warn!("[Receipts] Failed to build read status event: {}", e),
        }
    }
}
