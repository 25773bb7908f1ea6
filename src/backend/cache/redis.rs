//! Redis-backed ephemeral cache
//!
//! Uses a `ConnectionManager` so a dropped connection is re-established
//! transparently; individual command failures surface as `CacheError::Redis`
//! and are handled (usually logged and swallowed) by the calling service.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::{keys, parse_uuid, CacheError, CacheResult, EphemeralCache};

const CONNECT_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 200;
const MAX_RETRY_DELAY_MS: u64 = 2_000;

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis, retrying with exponential backoff
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("[Cache] Connecting to Redis at {}", redis_url);
        let client = redis::Client::open(redis_url)?;

        let mut delay_ms = INITIAL_RETRY_DELAY_MS;
        let mut attempt = 0;
        loop {
            match ConnectionManager::new(client.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("[Cache] Redis connection established after {} retries", attempt);
                    }
                    return Ok(Self { manager });
                }
                Err(e) if attempt < CONNECT_RETRIES => {
                    warn!(
                        "[Cache] Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                        attempt + 1,
                        CONNECT_RETRIES + 1,
                        delay_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms * 2).min(MAX_RETRY_DELAY_MS);
                    attempt += 1;
                }
                Err(e) => return Err(CacheError::Redis(e)),
            }
        }
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl EphemeralCache for RedisCache {
    async fn add_online_user(&self, user_id: &str) -> CacheResult<bool> {
        let mut conn = self.conn();
        let added: i64 = redis::cmd("SADD")
            .arg(keys::ONLINE_USERS)
            .arg(user_id)
            .query_async(&mut conn)
            .await?;
        Ok(added > 0)
    }

    async fn remove_online_user(&self, user_id: &str) -> CacheResult<bool> {
        let mut conn = self.conn();
        let removed: i64 = redis::cmd("SREM")
            .arg(keys::ONLINE_USERS)
            .arg(user_id)
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn is_online(&self, user_id: &str) -> CacheResult<bool> {
        let mut conn = self.conn();
        let member: bool = redis::cmd("SISMEMBER")
            .arg(keys::ONLINE_USERS)
            .arg(user_id)
            .query_async(&mut conn)
            .await?;
        Ok(member)
    }

    async fn online_users(&self) -> CacheResult<Vec<String>> {
        let mut conn = self.conn();
        let mut members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(keys::ONLINE_USERS)
            .query_async(&mut conn)
            .await?;
        members.sort();
        Ok(members)
    }

    async fn set_last_read(&self, chatroom_id: Uuid, user_id: &str, message_id: Uuid) -> CacheResult<()> {
        let mut conn = self.conn();
        let _: i64 = redis::cmd("HSET")
            .arg(keys::last_read(chatroom_id))
            .arg(user_id)
            .arg(message_id.to_string())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn last_read(&self, chatroom_id: Uuid, user_id: &str) -> CacheResult<Option<Uuid>> {
        let key = keys::last_read(chatroom_id);
        let mut conn = self.conn();
        let raw: Option<String> = redis::cmd("HGET")
            .arg(&key)
            .arg(user_id)
            .query_async(&mut conn)
            .await?;
        raw.map(|value| parse_uuid(&key, &value)).transpose()
    }

    async fn push_recent_message(
        &self,
        chatroom_id: Uuid,
        score_millis: i64,
        payload: &str,
        capacity: usize,
    ) -> CacheResult<usize> {
        let key = keys::recent_messages(chatroom_id);
        let keep = capacity as i64;
        let mut conn = self.conn();
        // Keep the `capacity` highest scores; ranks are ascending by score.
        let (_, _, size): (i64, i64, usize) = redis::pipe()
            .atomic()
            .cmd("ZADD")
            .arg(&key)
            .arg(score_millis)
            .arg(payload)
            .cmd("ZREMRANGEBYRANK")
            .arg(&key)
            .arg(0)
            .arg(-(keep + 1))
            .cmd("ZCARD")
            .arg(&key)
            .query_async(&mut conn)
            .await?;
        Ok(size)
    }

    async fn recent_messages(&self, chatroom_id: Uuid) -> CacheResult<Vec<String>> {
        let mut conn = self.conn();
        let entries: Vec<String> = redis::cmd("ZRANGE")
            .arg(keys::recent_messages(chatroom_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        Ok(entries)
    }

    async fn increment_message_count(&self, user_id: &str, chatroom_id: Uuid, ttl: Duration) -> CacheResult<u64> {
        let key = keys::message_count(user_id, chatroom_id);
        let mut conn = self.conn();
        let count: u64 = redis::cmd("INCR").arg(&key).query_async(&mut conn).await?;
        if count == 1 {
            let _: i64 = redis::cmd("EXPIRE")
                .arg(&key)
                .arg(ttl.as_secs().max(1))
                .query_async(&mut conn)
                .await?;
        }
        Ok(count)
    }

    async fn reset_message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<()> {
        let mut conn = self.conn();
        let _: i64 = redis::cmd("DEL")
            .arg(keys::message_count(user_id, chatroom_id))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn message_count(&self, user_id: &str, chatroom_id: Uuid) -> CacheResult<u64> {
        let mut conn = self.conn();
        let count: Option<u64> = redis::cmd("GET")
            .arg(keys::message_count(user_id, chatroom_id))
            .query_async(&mut conn)
            .await?;
        Ok(count.unwrap_or(0))
    }

    async fn health_check(&self) -> CacheResult<()> {
        let mut conn = self.conn();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        if response == "PONG" {
            Ok(())
        } else {
            Err(CacheError::unavailable(format!("unexpected PING response: {}", response)))
        }
    }
}
