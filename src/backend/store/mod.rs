//! Durable Store
//!
//! Authoritative persistence of rooms, messages and read receipts.
//!
//! The store is split into three narrow traits so each service only sees
//! what it owns:
//!
//! - [`RoomStore`] - rooms, participants, denormalized last message
//! - [`MessageStore`] - append-only messages with soft delete and time-ordered paging
//! - [`ReceiptStore`] - one receipt per (message, user), first write wins
//!
//! # Backends
//!
//! - [`postgres::PgStore`] - PostgreSQL via sqlx (schema in `migrations/`)
//! - [`memory::MemoryStore`] - in-process fallback and test double
//!
//! Soft-deleted messages are invisible to every listing and count; lookups
//! by id still return them so callers can report what happened.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::chat::{ChatMessage, ChatRoom, LastMessageInfo, ReadReceipt};
use crate::shared::SharedError;

/// Durable store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness rule (default team room, personal AI room) was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded into the domain model
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] SharedError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rooms and their membership
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert a new room with its participants.
    ///
    /// Fails with [`StoreError::Conflict`] when the room would be a second
    /// default room of a team or a second AI room of a (team, owner) pair.
    async fn insert_room(&self, room: &ChatRoom) -> StoreResult<()>;

    /// Room by id, including soft-deleted rooms
    async fn find_room(&self, id: Uuid) -> StoreResult<Option<ChatRoom>>;

    /// Set the room's deletion marker. Returns `false` if the room was missing or already deleted.
    async fn soft_delete_room(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Add a participant or re-activate a soft-deleted one.
    ///
    /// Returns `false` when the room is missing or the user was already active.
    /// Touches only that participant's row.
    async fn add_participant(&self, chatroom_id: Uuid, user_id: &str, joined_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Soft-delete one participant. Returns `false` if no active participant matched.
    async fn remove_participant(&self, chatroom_id: Uuid, user_id: &str, deleted_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Flip one active participant's notification flag, returning the new value
    async fn toggle_participant_notification(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<Option<bool>>;

    async fn find_default_team_room(&self, team_id: &str) -> StoreResult<Option<ChatRoom>>;

    async fn find_ai_room(&self, team_id: Option<&str>, owner_id: &str) -> StoreResult<Option<ChatRoom>>;

    /// Live rooms in which `user_id` is an active participant, optionally limited to one team
    async fn rooms_for_user(&self, user_id: &str, team_id: Option<&str>) -> StoreResult<Vec<ChatRoom>>;

    async fn update_last_message(&self, chatroom_id: Uuid, info: &LastMessageInfo) -> StoreResult<()>;

    /// Move a participant's read pointer. Returns `false` if no active participant matched.
    async fn update_participant_last_read(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        message_id: Uuid,
    ) -> StoreResult<bool>;
}

/// Append-only message log
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()>;

    /// Message by id, including soft-deleted messages
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>>;

    /// Set the deletion marker. Returns `false` if the message was missing or already deleted.
    async fn soft_delete_message(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Newest live message of a room
    async fn latest_message(&self, chatroom_id: Uuid) -> StoreResult<Option<ChatMessage>>;

    /// Live messages, newest first, skipping `offset`
    async fn page_messages(&self, chatroom_id: Uuid, offset: u64, limit: u64) -> StoreResult<Vec<ChatMessage>>;

    /// Live messages created strictly before `before`, newest first
    async fn messages_before(
        &self,
        chatroom_id: Uuid,
        before: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>>;

    /// Live messages created strictly after `after`, oldest first
    async fn messages_after(
        &self,
        chatroom_id: Uuid,
        after: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>>;

    /// Number of live messages created strictly after `after` (all of them when `None`)
    async fn count_messages_after(&self, chatroom_id: Uuid, after: Option<DateTime<Utc>>) -> StoreResult<u64>;
}

/// Read receipts
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn find_receipt(&self, message_id: Uuid, user_id: &str) -> StoreResult<Option<ReadReceipt>>;

    /// Insert unless a receipt for (message, user) exists; returns the stored receipt either way
    async fn insert_receipt(&self, receipt: &ReadReceipt) -> StoreResult<ReadReceipt>;

    async fn receipts_for_message(&self, message_id: Uuid) -> StoreResult<Vec<ReadReceipt>>;

    /// Latest `read_at` of the user's receipts in a room at or after `since`
    async fn last_read_at(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<DateTime<Utc>>>;

    /// Drop every receipt of a user in a room. Returns how many were removed.
    async fn delete_user_receipts(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<u64>;
}

/// Everything the services need from one durable backend
pub trait ChatStore: RoomStore + MessageStore + ReceiptStore {}

impl<T: RoomStore + MessageStore + ReceiptStore> ChatStore for T {}
