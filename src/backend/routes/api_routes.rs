/**
 * API Route Handlers
 *
 * REST surface under `/api/v1`. Every route here sits behind the auth
 * middleware.
 *
 * # Routes
 *
 * ## Rooms
 * - `POST /chatrooms`, `GET /chatrooms?teamId`
 * - `POST /chatrooms/default?teamId&name`, `POST /chatrooms/ai?teamId&name`
 * - `DELETE /chatrooms/{id}`
 * - `POST /chatrooms/{id}/participants?userId`
 * - `DELETE /chatrooms/{id}/participants/{userId}`
 * - `PUT /chatrooms/{id}/participants/{userId}/notification`
 * - `GET /chatrooms/{id}/notification`, `PUT /chatrooms/{id}/notification/toggle`
 * - `GET /chatrooms/notifications`
 *
 * ## Read state
 * - `PUT /chatrooms/{id}/read?messageId`, `GET /chatrooms/{id}/unread`
 * - `GET /chatrooms/{id}/read-summary`
 * - `GET /messages/{id}/receipts`, `GET /chatrooms/{id}/messages/{messageId}/read-status`
 *
 * ## History
 * - `GET /chatrooms/{id}/messages?page&size`
 * - `GET /chatrooms/{id}/messages/before/{messageId}?limit`
 * - `GET /chatrooms/{id}/messages/after/{messageId}?limit`
 * - `GET /messages/{id}`, `DELETE /messages/{id}`
 *
 * ## Presence
 * - `GET /user-status/online-users`, `DELETE /user-status/logout`, `DELETE /user-status/{userId}`
 *
 * ## Teams
 * - `POST /teams/{teamId}/roulette`, `GET /teams/{teamId}/members`
 */

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::chat::handlers as chat;
use crate::backend::presence::handlers as presence;
use crate::backend::receipts::handlers as receipts;
use crate::backend::server::state::AppState;

/// Routes of `/api/v1`, without the prefix
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Rooms
        .route("/chatrooms", post(chat::create_room).get(chat::list_rooms))
        .route("/chatrooms/default", post(chat::create_default_room))
        .route("/chatrooms/ai", post(chat::create_ai_room))
        .route("/chatrooms/notifications", get(chat::list_notifications))
        .route("/chatrooms/{id}", delete(chat::delete_room))
        .route("/chatrooms/{id}/participants", post(chat::add_participant))
        .route(
            "/chatrooms/{id}/participants/{user_id}",
            delete(chat::remove_participant),
        )
        .route(
            "/chatrooms/{id}/participants/{user_id}/notification",
            put(chat::toggle_participant_notification),
        )
        .route("/chatrooms/{id}/notification", get(chat::get_notification))
        .route("/chatrooms/{id}/notification/toggle", put(chat::toggle_notification))
        // Read state
        .route("/chatrooms/{id}/read", put(receipts::mark_read))
        .route("/chatrooms/{id}/unread", get(receipts::unread_count))
        .route("/chatrooms/{id}/read-summary", get(chat::read_summary))
        .route(
            "/chatrooms/{id}/messages/{message_id}/read-status",
            get(receipts::message_read_status),
        )
        .route("/messages/{id}/receipts", get(receipts::message_receipts))
        // History
        .route("/chatrooms/{id}/messages", get(chat::list_messages))
        .route(
            "/chatrooms/{id}/messages/before/{message_id}",
            get(chat::messages_before),
        )
        .route(
            "/chatrooms/{id}/messages/after/{message_id}",
            get(chat::messages_after),
        )
        .route("/messages/{id}", get(chat::get_message).delete(chat::delete_message))
        // Presence
        .route("/user-status/online-users", get(presence::online_users))
        .route("/user-status/logout", delete(presence::logout))
        .route("/user-status/{user_id}", delete(presence::force_offline))
        // Teams
        .route("/teams/{team_id}/roulette", post(chat::post_roulette_result))
        .route("/teams/{team_id}/members", get(chat::team_members))
}
