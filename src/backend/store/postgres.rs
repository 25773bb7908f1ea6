/**
 * PostgreSQL Durable Store
 *
 * sqlx-backed implementation of the room, message and receipt stores.
 * Schema lives in `migrations/` and is applied by `PgStore::migrate`.
 *
 * Messages carry a `seq` column so rows with equal `created_at` keep their
 * insertion order in every listing.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{MessageStore, ReceiptStore, RoomStore, StoreError, StoreResult};
use crate::shared::chat::{
    ChatMessage, ChatRoom, ChatRoomType, LastMessageInfo, MessageType, Participant, ReadReceipt,
};

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool to `database_url`
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn participants_for(&self, room_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<Participant>>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT chatroom_id, user_id, notification_enabled, last_read_message_id, joined_at, deleted_at
            FROM chat_room_participants
            WHERE chatroom_id = ANY($1)
            ORDER BY joined_at ASC
            "#,
        )
        .bind(room_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_room: HashMap<Uuid, Vec<Participant>> = HashMap::new();
        for row in rows {
            by_room.entry(row.chatroom_id).or_default().push(row.into_participant());
        }
        Ok(by_room)
    }

    async fn hydrate(&self, rows: Vec<RoomRow>) -> StoreResult<Vec<ChatRoom>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut participants = self.participants_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let members = participants.remove(&row.id).unwrap_or_default();
                row.into_room(members)
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    team_id: Option<String>,
    name: String,
    room_type: String,
    is_default: bool,
    owner_id: Option<String>,
    last_message_id: Option<Uuid>,
    last_message_content: Option<String>,
    last_message_sender_id: Option<String>,
    last_message_sender_name: Option<String>,
    last_message_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl RoomRow {
    fn into_room(self, participants: Vec<Participant>) -> StoreResult<ChatRoom> {
        let last_message = match (
            self.last_message_id,
            self.last_message_content,
            self.last_message_sender_id,
            self.last_message_sent_at,
        ) {
            (Some(id), Some(content), Some(sender_id), Some(sent_at)) => Some(LastMessageInfo {
                id,
                content,
                sender_id,
                sender_name: self.last_message_sender_name,
                sent_at,
            }),
            _ => None,
        };

        Ok(ChatRoom {
            id: self.id,
            team_id: self.team_id,
            name: self.name,
            room_type: ChatRoomType::parse(&self.room_type)?,
            is_default: self.is_default,
            owner_id: self.owner_id,
            participants,
            last_message,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    chatroom_id: Uuid,
    user_id: String,
    notification_enabled: bool,
    last_read_message_id: Option<Uuid>,
    joined_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ParticipantRow {
    fn into_participant(self) -> Participant {
        Participant {
            user_id: self.user_id,
            notification_enabled: self.notification_enabled,
            last_read_message_id: self.last_read_message_id,
            joined_at: self.joined_at,
            deleted_at: self.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    chatroom_id: Uuid,
    sender_id: String,
    sender_name: Option<String>,
    message_type: String,
    content: String,
    metadata: Option<sqlx::types::Json<HashMap<String, Value>>>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            id: row.id,
            chatroom_id: row.chatroom_id,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            message_type: MessageType::parse(&row.message_type)?,
            content: row.content,
            metadata: row.metadata.map(|json| json.0),
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn into_messages(rows: Vec<MessageRow>) -> StoreResult<Vec<ChatMessage>> {
    rows.into_iter().map(ChatMessage::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct ReceiptRow {
    message_id: Uuid,
    user_id: String,
    chatroom_id: Uuid,
    read_at: DateTime<Utc>,
}

impl From<ReceiptRow> for ReadReceipt {
    fn from(row: ReceiptRow) -> Self {
        ReadReceipt {
            message_id: row.message_id,
            user_id: row.user_id,
            chatroom_id: row.chatroom_id,
            read_at: row.read_at,
        }
    }
}

const ROOM_COLUMNS: &str = "id, team_id, name, room_type, is_default, owner_id, \
    last_message_id, last_message_content, last_message_sender_id, last_message_sender_name, \
    last_message_sent_at, created_at, deleted_at";

const MESSAGE_COLUMNS: &str =
    "id, chatroom_id, sender_id, sender_name, message_type, content, metadata, created_at, deleted_at";

#[async_trait]
impl RoomStore for PgStore {
    async fn insert_room(&self, room: &ChatRoom) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO chat_rooms (id, team_id, name, room_type, is_default, owner_id, created_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(room.id)
        .bind(&room.team_id)
        .bind(&room.name)
        .bind(room.room_type.as_str())
        .bind(room.is_default)
        .bind(&room.owner_id)
        .bind(room.created_at)
        .bind(room.deleted_at)
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Err(StoreError::Conflict(db_err.message().to_string()));
            }
        }
        inserted?;

        for participant in &room.participants {
            insert_participant(&mut tx, room.id, participant).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_room(&self, id: Uuid) -> StoreResult<Option<ChatRoom>> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM chat_rooms WHERE id = $1",
            ROOM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn soft_delete_room(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE chat_rooms SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(deleted_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_participant(&self, chatroom_id: Uuid, user_id: &str, joined_at: DateTime<Utc>) -> StoreResult<bool> {
        // A re-activated participant keeps its notification flag and read pointer
        let result = sqlx::query(
            r#"
            INSERT INTO chat_room_participants (chatroom_id, user_id, joined_at)
            SELECT id, $2, $3 FROM chat_rooms WHERE id = $1
            ON CONFLICT (chatroom_id, user_id) DO UPDATE SET
                joined_at = EXCLUDED.joined_at,
                deleted_at = NULL
            WHERE chat_room_participants.deleted_at IS NOT NULL
            "#,
        )
        .bind(chatroom_id)
        .bind(user_id)
        .bind(joined_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_participant(&self, chatroom_id: Uuid, user_id: &str, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_room_participants
            SET deleted_at = $3
            WHERE chatroom_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(chatroom_id)
        .bind(user_id)
        .bind(deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_participant_notification(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<Option<bool>> {
        let enabled: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE chat_room_participants
            SET notification_enabled = NOT notification_enabled
            WHERE chatroom_id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING notification_enabled
            "#,
        )
        .bind(chatroom_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enabled)
    }

    async fn find_default_team_room(&self, team_id: &str) -> StoreResult<Option<ChatRoom>> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM chat_rooms WHERE team_id = $1 AND is_default AND deleted_at IS NULL LIMIT 1",
            ROOM_COLUMNS
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.hydrate(rows).await?.pop())
    }

    async fn find_ai_room(&self, team_id: Option<&str>, owner_id: &str) -> StoreResult<Option<ChatRoom>> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM chat_rooms \
             WHERE room_type = 'AI' AND team_id IS NOT DISTINCT FROM $1 AND owner_id = $2 \
             AND deleted_at IS NULL LIMIT 1",
            ROOM_COLUMNS
        ))
        .bind(team_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.hydrate(rows).await?.pop())
    }

    async fn rooms_for_user(&self, user_id: &str, team_id: Option<&str>) -> StoreResult<Vec<ChatRoom>> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM chat_rooms r \
             WHERE r.deleted_at IS NULL \
             AND ($2::TEXT IS NULL OR r.team_id = $2) \
             AND EXISTS ( \
                 SELECT 1 FROM chat_room_participants p \
                 WHERE p.chatroom_id = r.id AND p.user_id = $1 AND p.deleted_at IS NULL) \
             ORDER BY COALESCE(r.last_message_sent_at, r.created_at) DESC",
            ROOM_COLUMNS
        ))
        .bind(user_id)
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn update_last_message(&self, chatroom_id: Uuid, info: &LastMessageInfo) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE chat_rooms
            SET last_message_id = $2,
                last_message_content = $3,
                last_message_sender_id = $4,
                last_message_sender_name = $5,
                last_message_sent_at = $6
            WHERE id = $1
            "#,
        )
        .bind(chatroom_id)
        .bind(info.id)
        .bind(&info.content)
        .bind(&info.sender_id)
        .bind(&info.sender_name)
        .bind(info.sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_participant_last_read(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        message_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_room_participants
            SET last_read_message_id = $3
            WHERE chatroom_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(chatroom_id)
        .bind(user_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_participant(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    chatroom_id: Uuid,
    participant: &Participant,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_room_participants
            (chatroom_id, user_id, notification_enabled, last_read_message_id, joined_at, deleted_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(chatroom_id)
    .bind(&participant.user_id)
    .bind(participant.notification_enabled)
    .bind(participant.last_read_message_id)
    .bind(participant.joined_at)
    .bind(participant.deleted_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages
                (id, chatroom_id, sender_id, sender_name, message_type, content, metadata, created_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(message.id)
        .bind(message.chatroom_id)
        .bind(&message.sender_id)
        .bind(&message.sender_name)
        .bind(message.message_type.as_str())
        .bind(&message.content)
        .bind(message.metadata.as_ref().map(sqlx::types::Json))
        .bind(message.created_at)
        .bind(message.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM chat_messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ChatMessage::try_from).transpose()
    }

    async fn soft_delete_message(&self, id: Uuid, deleted_at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE chat_messages SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_message(&self, chatroom_id: Uuid) -> StoreResult<Option<ChatMessage>> {
        Ok(self.page_messages(chatroom_id, 0, 1).await?.pop())
    }

    async fn page_messages(&self, chatroom_id: Uuid, offset: u64, limit: u64) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM chat_messages \
             WHERE chatroom_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, seq DESC \
             OFFSET $2 LIMIT $3",
            MESSAGE_COLUMNS
        ))
        .bind(chatroom_id)
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_messages(rows)
    }

    async fn messages_before(
        &self,
        chatroom_id: Uuid,
        before: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM chat_messages \
             WHERE chatroom_id = $1 AND deleted_at IS NULL AND created_at < $2 \
             ORDER BY created_at DESC, seq DESC \
             LIMIT $3",
            MESSAGE_COLUMNS
        ))
        .bind(chatroom_id)
        .bind(before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_messages(rows)
    }

    async fn messages_after(
        &self,
        chatroom_id: Uuid,
        after: DateTime<Utc>,
        limit: u64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM chat_messages \
             WHERE chatroom_id = $1 AND deleted_at IS NULL AND created_at > $2 \
             ORDER BY created_at ASC, seq ASC \
             LIMIT $3",
            MESSAGE_COLUMNS
        ))
        .bind(chatroom_id)
        .bind(after)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_messages(rows)
    }

    async fn count_messages_after(&self, chatroom_id: Uuid, after: Option<DateTime<Utc>>) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM chat_messages
            WHERE chatroom_id = $1
              AND deleted_at IS NULL
              AND ($2::TIMESTAMPTZ IS NULL OR created_at > $2)
            "#,
        )
        .bind(chatroom_id)
        .bind(after)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl ReceiptStore for PgStore {
    async fn find_receipt(&self, message_id: Uuid, user_id: &str) -> StoreResult<Option<ReadReceipt>> {
        let row = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT message_id, user_id, chatroom_id, read_at
            FROM chat_read_receipts
            WHERE message_id = $1 AND user_id = $2
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ReadReceipt::from))
    }

    async fn insert_receipt(&self, receipt: &ReadReceipt) -> StoreResult<ReadReceipt> {
        sqlx::query(
            r#"
            INSERT INTO chat_read_receipts (message_id, user_id, chatroom_id, read_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(receipt.message_id)
        .bind(&receipt.user_id)
        .bind(receipt.chatroom_id)
        .bind(receipt.read_at)
        .execute(&self.pool)
        .await?;

        // Whichever write landed first is the receipt
        self.find_receipt(receipt.message_id, &receipt.user_id)
            .await?
            .ok_or_else(|| StoreError::Unavailable("receipt vanished after insert".to_string()))
    }

    async fn receipts_for_message(&self, message_id: Uuid) -> StoreResult<Vec<ReadReceipt>> {
        let rows = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT message_id, user_id, chatroom_id, read_at
            FROM chat_read_receipts
            WHERE message_id = $1
            ORDER BY read_at ASC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ReadReceipt::from).collect())
    }

    async fn last_read_at(
        &self,
        chatroom_id: Uuid,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT MAX(read_at) FROM chat_read_receipts
            WHERE chatroom_id = $1 AND user_id = $2 AND read_at >= $3
            "#,
        )
        .bind(chatroom_id)
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    async fn delete_user_receipts(&self, chatroom_id: Uuid, user_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM chat_read_receipts WHERE chatroom_id = $1 AND user_id = $2")
            .bind(chatroom_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
