/**
 * Read Receipt HTTP Handlers
 *
 * Marking a room read does not check membership first: the write chain has
 * to work while the durable store is down, and a receipt from a
 * non-participant is ignored by every read view.
 */

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::chat::{MessageReadStatus, ReadReceipt, UnreadCount};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadQuery {
    pub message_id: Option<Uuid>,
}

/// PUT /chatrooms/{id}/read?messageId
///
/// Marks one message when `messageId` is given, otherwise the newest one.
/// Answers `null` for an empty room.
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
    Query(query): Query<MarkReadQuery>,
) -> BackendResult<Json<Option<ReadReceipt>>> {
    let receipt = match query.message_id {
        Some(message_id) => Some(state.receipts.mark_read(chatroom_id, message_id, &user.user_id).await?),
        None => state.receipts.mark_all_read(chatroom_id, &user.user_id).await?,
    };
    Ok(Json(receipt))
}

/// GET /chatrooms/{id}/unread
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
) -> BackendResult<Json<UnreadCount>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let unread_count = state.receipts.unread_count(chatroom_id, &user.user_id).await?;
    Ok(Json(UnreadCount {
        chatroom_id,
        unread_count,
    }))
}

/// GET /messages/{id}/receipts
pub async fn message_receipts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> BackendResult<Json<Vec<ReadReceipt>>> {
    let message = state.delivery.get_message(message_id).await?;
    state.rooms.member_room(message.chatroom_id, &user.user_id).await?;
    Ok(Json(state.receipts.get_receipts(message_id).await?))
}

/// GET /chatrooms/{id}/messages/{messageId}/read-status
pub async fn message_read_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((chatroom_id, message_id)): Path<(Uuid, Uuid)>,
) -> BackendResult<Json<MessageReadStatus>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let status = state.receipts.message_read_status(chatroom_id, message_id).await?;
    Ok(Json(status))
}
