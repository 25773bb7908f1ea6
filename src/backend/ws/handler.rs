/**
 * WebSocket Upgrade Handler
 *
 * `GET /ws` upgrades to a WebSocket. The token (`Authorization: Bearer` or
 * `?token=`) is verified before the upgrade; a missing or invalid token does
 * not refuse the upgrade but leaves the session unauthenticated, and every
 * inbound frame on it is answered with an error frame.
 *
 * The socket is split: a writer task drains the session's outbound queue
 * while the read loop feeds text frames to the session in order.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, Uri},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::frames::OutboundFrame;
use super::session::WsSession;
use crate::backend::middleware::{authenticate, AuthenticatedUser};
use crate::backend::server::state::AppState;

/// Outbound frames buffered per connection before the writer applies backpressure
const OUTBOUND_QUEUE: usize = 256;

/// Handle WebSocket upgrade (GET /ws)
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let principal = match authenticate(&state.verifier, &headers, &uri) {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("[WS] Upgrading without a principal: {}", e);
            None
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, principal))
}

async fn handle_socket(socket: WebSocket, state: AppState, principal: Option<AuthenticatedUser>) {
    let session_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundFrame>(OUTBOUND_QUEUE);

    let mut session = WsSession::open(session_id.clone(), principal, state, outbound_tx).await;
    info!(
        "[WS] Session {} opened for {:?}",
        session_id,
        session.user().map(|u| u.user_id.as_str())
    );

    let writer_session = session_id.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!("[WS] Failed to serialize frame for {}: {}", writer_session, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!("[WS] Socket of {} closed while writing", writer_session);
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("[WS] Read error on {}: {}", session_id, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    let outcome = session.close();
    writer.abort();
    info!("[WS] Session {} closed: {:?}", session_id, outcome);
}
