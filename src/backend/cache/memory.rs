//! In-memory ephemeral cache
//!
//! Single-process stand-in for Redis with the same atomicity: every operation
//! takes the state lock once, so add/remove/increment report exactly what
//! they changed. Counter expiry uses `tokio::time::Instant` so paused-clock
//! tests can advance past the TTL.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use super::{CacheResult, EphemeralCache};

#[derive(Debug)]
struct Counter {
    value: u64,
    expires_at: Instant,
}

impl Counter {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    online: BTreeSet<String>,
    last_read: HashMap<Uuid, HashMap<String, Uuid>>,
    /// Ordered by (score, payload), the same ordering as a Redis sorted set
    recent: HashMap<Uuid, BTreeSet<(i64, String)>>,
    counters: HashMap<(String, Uuid), Counter>,
}

#[derive(Clone, Default)]
pub struct MemoryCache {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EphemeralCache for MemoryCache {
    async fn add_online_user(&self, user_id: &str) -> CacheResult<bool> {
        Ok(self.state.write().await.online.insert(user_id.to_string()))
    }

    async fn remove_online_user(&self, user_id: &str) -> CacheResult<bool> {
        Ok(self.state.write().await.online.remove(user_id))
    }

    async fn is_online(&self, user_id: &str) -> CacheResult<bool> {
        Ok(self.state.read().await.online.contains(user_id))
    }

    async fn online_users(&self) -> CacheResult<Vec<String>> {
        Ok(self.state.read().await.online.iter().cloned().collect())
    }

    async fn set_last_read(&self, chatroom_id: Uuid, user_id: &str, message_id: Uuid) -> CacheResult<()> {
        self.state
            .write()
            .await
            .last_read
            .entry(chatroom_id)
            .or_default()
            .insert(user_id.to_string(), message_id);
        Ok(())
    }

    async fn last_read(&self, chatroom_id: Uuid, user_id: &str) -> CacheResult<Option<Uuid>> {
        Ok(self
            .state
            .read()
            .await
            .last_read
            .get(&chatroom_id)
            .and_then(|room| room.get(user_id).copied()))
    }

    async fn push_recent_message(
        &self,
        chatroom_id: Uuid,
        score_millis: i64,
        payload: &str,
        capacity: usize,
    ) -> CacheResult<usize> {
        let mut state = self.state.write().await;
        let entries = state.recent.entry(chatroom_id).or_default();

        // Sorted-set semantics: re-adding a member only moves its score.
        entries.retain(|(_, existing)| existing != payload);
        entries.insert((score_millis, payload.to_string()));

        while entries.len() > capacity {
            entries.pop_first();
        }
        Ok(entries.len())
    }

    async fn recent_messages(&self, chatroom_id: Uuid) -> CacheResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .await
            .recent
            .get(&chatroom_id)
            .map(|entries| entries.iter().map(|(_, payload)| payload.clone()).collect())
            .unwrap_or_default())
    }

    async fn increment_message_count(&self, user_id: &str, chatroom_id: Uuid, ttl: Duration) -> CacheResult<u64> {
        let mut state = self.state.write().await;
        let key = (user_id.to_string(), chatroom_id);
        if state.counters.get(&key).is_some_and(Counter::is_expired) {
            state.counters.remove(&key);
        }
        let counter = state.counters.entry(key).or_insert_with(|| Counter {
            value: 0,
            expires_at: Instant::now() + ttl,
        });
        counter.value += 1;
        Ok(counter.value)
    }

    async fn reset_message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<()> {
        self.state
            .write()
            .await
            .counters
            .remove(&(user_id.to_string(), chatroom_id));
        Ok(())
    }

    async fn message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .counters
            .get(&(user_id.to_string(), chatroom_id))
            .filter(|counter| !counter.is_expired())
            .map(|counter| counter.value)
            .unwrap_or(0))
    }

    async fn health_check(&self) -> CacheResult<()> {
        Ok(())
    }
}
