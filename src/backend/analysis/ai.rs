/**
 * AI Assistant Session
 *
 * `chat.ai.init` resolves (or creates) the user's AI room and posts a
 * greeting. Every user message delivered into an AI room is handed to the
 * responder on a spawned task; the reply is posted back as the AI identity.
 * Replies are fire-and-forget: failures are logged and dropped.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::analyzer::AnalysisError;
use crate::backend::chat::{Delivered, MessageDeliveryService, RoomService};
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::chat::{ChatMessage, ChatRoom, ChatRoomType, MessageType};

pub const AI_GREETING: &str = "Hi! I'm your assistant. How is your day going?";

#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Reply to `text` written by `user_id`. `Ok(None)` means no reply.
    async fn reply(&self, user_id: &str, text: &str) -> Result<Option<String>, AnalysisError>;
}

/// POSTs `{"userId", "message"}` and expects `{"reply"}`
pub struct HttpAiResponder {
    client: Client,
    endpoint: String,
}

impl HttpAiResponder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    user_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct ReplyResponse {
    #[serde(default)]
    reply: Option<String>,
}

#[async_trait]
impl AiResponder for HttpAiResponder {
    async fn reply(&self, user_id: &str, text: &str) -> Result<Option<String>, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ReplyRequest { user_id, message: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.json::<ReplyResponse>().await?;
        Ok(body.reply.filter(|reply| !reply.trim().is_empty()))
    }
}

/// Used when no responder endpoint is configured
pub struct DisabledAiResponder;

#[async_trait]
impl AiResponder for DisabledAiResponder {
    async fn reply(&self, user_id: &str, _text: &str) -> Result<Option<String>, AnalysisError> {
        debug!("[Analysis] AI responder disabled, no reply for {}", user_id);
        Ok(None)
    }
}

#[derive(Clone)]
pub struct AiChatService {
    delivery: MessageDeliveryService,
    rooms: RoomService,
    responder: Arc<dyn AiResponder>,
}

impl AiChatService {
    pub fn new(delivery: MessageDeliveryService, rooms: RoomService, responder: Arc<dyn AiResponder>) -> Self {
        Self {
            delivery,
            rooms,
            responder,
        }
    }

    /// Resolve the user's AI room (an explicit one, or the personal room of
    /// `team_id`) and post a greeting into it
    pub async fn init_session(
        &self,
        user_id: &str,
        chatroom_id: Option<Uuid>,
        team_id: Option<&str>,
    ) -> BackendResult<Delivered> {
        let room = match chatroom_id {
            Some(id) => {
                let room = self.rooms.member_room(id, user_id).await?;
                if room.room_type != ChatRoomType::Ai {
                    return Err(BackendError::validation(format!("chat room {} is not an AI room", id)));
                }
                room
            }
            None => self.rooms.create_or_get_ai_room(team_id, user_id, "").await?,
        };

        info!("[Analysis] AI session for {} in {}", user_id, room.id);
        self.delivery.send_as_ai(room.id, AI_GREETING, MessageType::Text).await
    }

    /// Spawn a reply when `message` is a user message in an AI room
    pub fn on_delivered(&self, room: &ChatRoom, message: &ChatMessage) -> bool {
        if room.room_type != ChatRoomType::Ai
            || self.delivery.config().is_ai_sender(&message.sender_id)
            || message.message_type == MessageType::System
        {
            return false;
        }

        let service = self.clone();
        let chatroom_id = room.id;
        let user_id = message.sender_id.clone();
        let text = message.content.clone();
        tokio::spawn(async move {
            service.respond(chatroom_id, &user_id, &text).await;
        });
        true
    }

    async fn respond(&self, chatroom_id: Uuid, user_id: &str, text: &str) {
        match self.responder.reply(user_id, text).await {
            Ok(Some(reply)) => {
                if let Err(e) = self.delivery.send_as_ai(chatroom_id, reply, MessageType::Text).await {
                    error!("[Analysis] Failed to post AI reply in {}: {}", chatroom_id, e);
                }
            }
            Ok(None) => debug!("[Analysis] No AI reply for {} in {}", user_id, chatroom_id),
            Err(e) => warn!("[Analysis] AI responder failed for {}: {}", user_id, e),
        }
    }
}
