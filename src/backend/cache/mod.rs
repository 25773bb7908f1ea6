//! Ephemeral Cache
//!
//! Shared, non-authoritative state used by every server instance:
//!
//! - the online-user set (presence)
//! - per-room last-read pointers (read-state accelerator)
//! - a bounded per-room ring of recent messages ordered by epoch-millisecond score
//! - per-(user, room) message counters with a TTL (analysis trigger)
//!
//! All mutations use the backend's native atomic primitives (set add/remove,
//! INCR) so concurrent instances never race on read-modify-write.
//!
//! # Backends
//!
//! - [`redis::RedisCache`] - Redis via `ConnectionManager`
//! - [`memory::MemoryCache`] - single-process fallback and test double

/// Key names shared across instances
pub mod keys;
/// In-memory cache implementation
pub mod memory;
/// Redis cache implementation
pub mod redis;

pub use memory::MemoryCache;
pub use self::redis::RedisCache;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Ephemeral cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt cache entry under {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Operations the chat core needs from the ephemeral cache
#[async_trait]
pub trait EphemeralCache: Send + Sync {
    /// Add a user to the online set. Returns `true` when the user was not already a member.
    async fn add_online_user(&self, user_id: &str) -> CacheResult<bool>;

    /// Remove a user from the online set. Returns `true` when a member was actually removed.
    async fn remove_online_user(&self, user_id: &str) -> CacheResult<bool>;

    async fn is_online(&self, user_id: &str) -> CacheResult<bool>;

    async fn online_users(&self) -> CacheResult<Vec<String>>;

    /// Record `user_id`'s last read message in a room
    async fn set_last_read(&self, chatroom_id: Uuid, user_id: &str, message_id: Uuid) -> CacheResult<()>;

    async fn last_read(&self, chatroom_id: Uuid, user_id: &str) -> CacheResult<Option<Uuid>>;

    /// Add a serialized message to the room's recent set and trim it to `capacity`,
    /// evicting the lowest scores first. Returns the resulting size.
    async fn push_recent_message(
        &self,
        chatroom_id: Uuid,
        score_millis: i64,
        payload: &str,
        capacity: usize,
    ) -> CacheResult<usize>;

    /// Recent messages of a room, oldest first
    async fn recent_messages(&self, chatroom_id: Uuid) -> CacheResult<Vec<String>>;

    /// Atomically increment the (user, room) counter. The TTL is set when the
    /// increment created the counter.
    async fn increment_message_count(&self, user_id: &str, chatroom_id: Uuid, ttl: Duration) -> CacheResult<u64>;

    async fn reset_message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<()>;

    async fn message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<u64>;

    /// Check that the backend answers
    async fn health_check(&self) -> CacheResult<()>;
}

fn parse_uuid(key: &str, raw: &str) -> CacheResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| CacheError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}
