/**
 * Chat HTTP Handlers
 *
 * REST surface of rooms, message history, roulette announcements and team
 * member listings. Every handler runs behind the auth middleware; the caller
 * is the `sub` of the session token.
 *
 * Reads of a room's content (history, read summary, notification flag)
 * require the caller to be an active participant.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::analysis::{enrich_with_mood, MemberWithMood};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::chat::{
    ChatMessage, ChatRoom, ChatRoomSummary, CreateChatRoomRequest, MessagePage, NotificationSetting,
    RoomReadSummary,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_ROOM_NAME: &str = "General";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantQuery {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RouletteRequest {
    pub result: String,
}

/// POST /chatrooms
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateChatRoomRequest>,
) -> BackendResult<(StatusCode, Json<ChatRoom>)> {
    let room = state.rooms.create_room(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// POST /chatrooms/default?teamId&name
pub async fn create_default_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TeamQuery>,
) -> BackendResult<Json<ChatRoom>> {
    let team_id = query
        .team_id
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BackendError::validation("teamId is required"))?;
    let name = query.name.unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string());
    let room = state.rooms.create_default_room(&team_id, &name, &user.user_id).await?;
    Ok(Json(room))
}

/// POST /chatrooms/ai?teamId&name
pub async fn create_ai_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TeamQuery>,
) -> BackendResult<Json<ChatRoom>> {
    let room = state
        .rooms
        .create_or_get_ai_room(query.team_id.as_deref(), &user.user_id, query.name.as_deref().unwrap_or(""))
        .await?;
    Ok(Json(room))
}

/// GET /chatrooms?teamId
pub async fn list_rooms(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TeamQuery>,
) -> BackendResult<Json<Vec<ChatRoomSummary>>> {
    let rooms = state.rooms.rooms_for_user(&user.user_id, query.team_id.as_deref()).await?;
    Ok(Json(rooms))
}

/// DELETE /chatrooms/{id}
pub async fn delete_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
) -> BackendResult<StatusCode> {
    state.rooms.delete_room(chatroom_id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /chatrooms/{id}/participants?userId
pub async fn add_participant(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
    Query(query): Query<ParticipantQuery>,
) -> BackendResult<Json<ChatRoom>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let room = state.rooms.add_participant(chatroom_id, &query.user_id).await?;
    Ok(Json(room))
}

/// DELETE /chatrooms/{id}/participants/{userId}
pub async fn remove_participant(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((chatroom_id, user_id)): Path<(Uuid, String)>,
) -> BackendResult<StatusCode> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    state.rooms.remove_participant(chatroom_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /chatrooms/{id}/participants/{userId}/notification
pub async fn toggle_participant_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((chatroom_id, user_id)): Path<(Uuid, String)>,
) -> BackendResult<Json<NotificationSetting>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let setting = state.rooms.toggle_notification(chatroom_id, &user_id).await?;
    Ok(Json(setting))
}

/// GET /chatrooms/{id}/notification
pub async fn get_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
) -> BackendResult<Json<NotificationSetting>> {
    let setting = state.rooms.notification_setting(chatroom_id, &user.user_id).await?;
    Ok(Json(setting))
}

/// PUT /chatrooms/{id}/notification/toggle
pub async fn toggle_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
) -> BackendResult<Json<NotificationSetting>> {
    let setting = state.rooms.toggle_notification(chatroom_id, &user.user_id).await?;
    Ok(Json(setting))
}

/// GET /chatrooms/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<NotificationSetting>>> {
    let settings = state.rooms.notification_settings(&user.user_id).await?;
    Ok(Json(settings))
}

/// GET /chatrooms/{id}/read-summary
pub async fn read_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
) -> BackendResult<Json<RoomReadSummary>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let summary = state.rooms.read_summary(chatroom_id).await?;
    Ok(Json(summary))
}

/// GET /chatrooms/{id}/messages?page&size
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chatroom_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> BackendResult<Json<MessagePage>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let page = state
        .delivery
        .page(
            chatroom_id,
            query.page.unwrap_or(0),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// GET /chatrooms/{id}/messages/before/{messageId}?limit
pub async fn messages_before(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((chatroom_id, message_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<LimitQuery>,
) -> BackendResult<Json<Vec<ChatMessage>>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let messages = state
        .delivery
        .messages_before(chatroom_id, message_id, query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(messages))
}

/// GET /chatrooms/{id}/messages/after/{messageId}?limit
pub async fn messages_after(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((chatroom_id, message_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<LimitQuery>,
) -> BackendResult<Json<Vec<ChatMessage>>> {
    state.rooms.member_room(chatroom_id, &user.user_id).await?;
    let messages = state
        .delivery
        .messages_after(chatroom_id, message_id, query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(messages))
}

/// GET /messages/{id}
pub async fn get_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> BackendResult<Json<ChatMessage>> {
    let message = state.delivery.get_message(message_id).await?;
    state.rooms.member_room(message.chatroom_id, &user.user_id).await?;
    Ok(Json(message))
}

/// DELETE /messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> BackendResult<Json<ChatMessage>> {
    let message = state.delivery.delete(message_id, &user.user_id).await?;
    Ok(Json(message))
}

/// POST /teams/{teamId}/roulette
pub async fn post_roulette_result(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(team_id): Path<String>,
    Json(request): Json<RouletteRequest>,
) -> BackendResult<(StatusCode, Json<ChatMessage>)> {
    if request.result.trim().is_empty() {
        return Err(BackendError::validation("result cannot be empty"));
    }
    tracing::info!("[Delivery] Roulette result for team {} from {}", team_id, user.user_id);
    let delivered = state.delivery.send_roulette_result(&team_id, &request.result).await?;
    Ok((StatusCode::CREATED, Json(delivered.message)))
}

/// GET /teams/{teamId}/members
pub async fn team_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(team_id): Path<String>,
) -> BackendResult<Json<Vec<MemberWithMood>>> {
    let members = state.directory.team_members(&team_id).await?;
    if !members.iter().any(|m| m.user_id == user.user_id) {
        return Err(BackendError::access_denied(format!(
            "user {} is not a member of team {}",
            user.user_id, team_id
        )));
    }
    let enriched = members
        .into_iter()
        .map(|member| enrich_with_mood(member, &state.moods))
        .collect();
    Ok(Json(enriched))
}
