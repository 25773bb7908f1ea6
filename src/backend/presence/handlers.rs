/**
 * Presence HTTP Handlers
 *
 * Listing online users and explicit logout. Force-offline lets an operator
 * (or the account service on session revocation) mark another user offline.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::backend::middleware::AuthUser;
use crate::backend::presence::PresenceTracker;
use crate::shared::chat::OnlineUsers;

/// GET /user-status/online-users
pub async fn online_users(State(presence): State<PresenceTracker>, AuthUser(_user): AuthUser) -> Json<OnlineUsers> {
    let mut user_ids = presence.online_users().await;
    user_ids.sort();
    Json(OnlineUsers { user_ids })
}

/// DELETE /user-status/logout
pub async fn logout(State(presence): State<PresenceTracker>, AuthUser(user): AuthUser) -> StatusCode {
    presence.logout(&user.user_id).await;
    StatusCode::NO_CONTENT
}

/// DELETE /user-status/{userId}
pub async fn force_offline(
    State(presence): State<PresenceTracker>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<String>,
) -> StatusCode {
    tracing::info!("[Presence] {} forced {} offline", user.user_id, user_id);
    presence.logout(&user_id).await;
    StatusCode::NO_CONTENT
}
