/**
 * WebSocket Session
 *
 * State of one WebSocket connection: its principal, its topic
 * subscriptions and the queue of outbound frames. Frames are handled one at
 * a time in arrival order; hub events are forwarded by one task per
 * subscribed topic into the same outbound queue.
 *
 * The session knows nothing about the socket itself, which keeps it
 * testable with a plain channel.
 */

use std::collections::HashMap;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::frames::{InboundFrame, OutboundFrame};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::presence::DisconnectOutcome;
use crate::backend::server::state::AppState;
use crate::shared::chat::MessageType;
use crate::shared::event::topics;

pub struct WsSession {
    session_id: String,
    user: Option<AuthenticatedUser>,
    state: AppState,
    outbound: mpsc::Sender<OutboundFrame>,
    subscriptions: HashMap<String, AbortHandle>,
}

impl WsSession {
    /// Open a session and run the presence connect lifecycle
    pub async fn open(
        session_id: String,
        principal: Option<AuthenticatedUser>,
        state: AppState,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Self {
        let user = match state
            .presence
            .on_connect(&session_id, principal.as_ref().map(|p| p.user_id.as_str()))
        {
            Some(user_id) => {
                state.presence.on_connected(&session_id, &user_id).await;
                principal
            }
            None => None,
        };

        Self {
            session_id,
            user,
            state,
            outbound,
            subscriptions: HashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.subscriptions.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Handle one raw text frame
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => self.handle(frame).await,
            Err(e) => {
                debug!("[WS] Malformed frame on {}: {}", self.session_id, e);
                self.send(OutboundFrame::error(format!("malformed frame: {}", e))).await;
            }
        }
    }

    /// Handle one inbound frame; the reply goes to the outbound queue
    pub async fn handle(&mut self, frame: InboundFrame) {
        let action = frame.action();
        let Some(user) = self.user.clone() else {
            warn!("[WS] {} frame on unauthenticated session {}", action, self.session_id);
            self.send(OutboundFrame::error("unauthenticated session")).await;
            return;
        };

        let reply = match self.dispatch(&user, frame).await {
            Ok(payload) => OutboundFrame::ack(action, payload),
            Err(e) => {
                debug!("[WS] {} from {} failed: {}", action, user.user_id, e);
                OutboundFrame::error(e.message())
            }
        };
        self.send(reply).await;
    }

    async fn dispatch(&mut self, user: &AuthenticatedUser, frame: InboundFrame) -> BackendResult<serde_json::Value> {
        match frame {
            InboundFrame::ChatSend(send) => {
                if send.message_type == Some(MessageType::System) {
                    return Err(BackendError::validation("system messages cannot be sent by users"));
                }
                let request = send.into_request(&user.user_id, user.name.as_deref());
                let delivered = self.state.delivery.send(request).await?;
                self.state.ai_chat.on_delivered(&delivered.room, &delivered.message);
                Ok(serde_json::to_value(&delivered.message)?)
            }
            InboundFrame::ChatRead(read) => {
                let receipt = self
                    .state
                    .receipts
                    .mark_read(read.chatroom_id, read.message_id, &user.user_id)
                    .await?;
                Ok(serde_json::to_value(&receipt)?)
            }
            InboundFrame::AiInit(init) => {
                let delivered = self
                    .state
                    .ai_chat
                    .init_session(&user.user_id, init.chatroom_id, init.team_id.as_deref())
                    .await?;
                self.subscribe(topics::room(delivered.room.id));
                Ok(serde_json::json!({
                    "room": delivered.room,
                    "message": delivered.message,
                }))
            }
            InboundFrame::Subscribe(frame) => {
                if frame.topic != topics::PRESENCE {
                    let chatroom_id = topics::parse_room(&frame.topic)
                        .ok_or_else(|| BackendError::validation(format!("unknown topic {}", frame.topic)))?;
                    self.state.rooms.member_room(chatroom_id, &user.user_id).await?;
                }
                self.subscribe(frame.topic.clone());
                Ok(serde_json::json!({ "topic": frame.topic }))
            }
            InboundFrame::Unsubscribe(frame) => {
                let removed = self.unsubscribe(&frame.topic);
                Ok(serde_json::json!({ "topic": frame.topic, "removed": removed }))
            }
        }
    }

    /// Forward hub events of `topic` into the outbound queue. Idempotent.
    fn subscribe(&mut self, topic: String) {
        if self.subscriptions.contains_key(&topic) {
            return;
        }

        let mut receiver = self.state.hub.subscribe(&topic);
        let outbound = self.outbound.clone();
        let session_id = self.session_id.clone();
        let forward_topic = topic.clone();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let frame = OutboundFrame::Event {
                            topic: forward_topic.clone(),
                            event,
                        };
                        if outbound.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[WS] Session {} lagged on {}, skipped {} events", session_id, forward_topic, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
        .abort_handle();

        debug!("[WS] Session {} subscribed to {}", self.session_id, topic);
        self.subscriptions.insert(topic, handle);
    }

    fn unsubscribe(&mut self, topic: &str) -> bool {
        match self.subscriptions.remove(topic) {
            Some(handle) => {
                handle.abort();
                debug!("[WS] Session {} unsubscribed from {}", self.session_id, topic);
                true
            }
            None => false,
        }
    }

    async fn send(&self, frame: OutboundFrame) {
        if self.outbound.send(frame).await.is_err() {
            debug!("[WS] Outbound queue of {} closed", self.session_id);
        }
    }

    /// Tear down subscriptions and run the presence disconnect lifecycle
    pub fn close(mut self) -> DisconnectOutcome {
        for (_, handle) in self.subscriptions.drain() {
            handle.abort();
        }
        if self.user.is_none() {
            info!("[WS] Unauthenticated session {} closed", self.session_id);
            return DisconnectOutcome::UnknownSession;
        }
        self.state.presence.on_disconnect(&self.session_id)
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        for (_, handle) in self.subscriptions.drain() {
            handle.abort();
        }
    }
}
