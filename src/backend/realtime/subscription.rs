/**
 * Real-time Subscription Handler
 *
 * Server-Sent Events stream of hub topics for clients without a WebSocket.
 *
 * # Topics
 *
 * `?topics=` takes a comma-separated list of topic names (see
 * `shared::event::topics`). Without the parameter the stream carries
 * `presence` only. Room topics require the caller to be an active
 * participant of the room.
 *
 * # Connection Management
 *
 * - Kept alive with the SSE keep-alive comment lines
 * - Lagged receivers skip ahead and keep streaming
 * - A closed topic channel ends that topic only
 */

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt, StreamMap};

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::event::topics;
use crate::shared::{EventType, RealtimeEvent};

/// Most topics a single stream may carry
const MAX_TOPICS: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub struct RealtimeQuery {
    pub topics: Option<String>,
}

/// Requested topic names, deduplicated, `presence` when none are given
pub fn parse_topics(raw: Option<&str>) -> Vec<String> {
    let mut parsed: Vec<String> = Vec::new();
    for topic in raw.unwrap_or("").split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !parsed.iter().any(|t| t == topic) {
            parsed.push(topic.to_string());
        }
    }
    if parsed.is_empty() {
        parsed.push(topics::PRESENCE.to_string());
    }
    parsed
}

/// SSE event name of an event type
pub fn event_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Message => "message",
        EventType::MessageDeleted => "message_deleted",
        EventType::ReadStatus => "read_status",
        EventType::Presence => "presence",
    }
}

fn to_sse(topic: &str, item: Result<RealtimeEvent, BroadcastStreamRecvError>) -> Option<Event> {
    match item {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Event::default().event(event_name(event.event_type)).data(data)),
            Err(e) => {
                tracing::error!("[Realtime] Failed to serialize event on {}: {:?}", topic, e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("[Realtime] Subscriber lagged on {}, skipped {} events", topic, skipped);
            None
        }
    }
}

/// Handle real-time subscription (GET /realtime)
///
/// # Errors
///
/// * `400 Bad Request` - malformed room topic or too many topics
/// * `403 Forbidden` - room topic of a room the caller is not in
/// * `404 Not Found` - room topic of a missing room
pub async fn handle_realtime_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<RealtimeQuery>,
) -> BackendResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let requested = parse_topics(query.topics.as_deref());
    if requested.len() > MAX_TOPICS {
        return Err(BackendError::validation(format!("at most {} topics per stream", MAX_TOPICS)));
    }

    let mut streams = StreamMap::new();
    for topic in requested {
        if topic != topics::PRESENCE {
            let chatroom_id = topics::parse_room(&topic)
                .ok_or_else(|| BackendError::validation(format!("unknown topic {}", topic)))?;
            state.rooms.member_room(chatroom_id, &user.user_id).await?;
        }
        let receiver = state.hub.subscribe(&topic);
        streams.insert(topic, BroadcastStream::new(receiver));
    }

    tracing::info!(
        "[Realtime] {} subscribed to {:?}",
        user.user_id,
        streams.keys().collect::<Vec<_>>()
    );

    let stream = streams
        .filter_map(|(topic, item)| to_sse(&topic, item))
        .map(Ok::<_, Infallible>);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
