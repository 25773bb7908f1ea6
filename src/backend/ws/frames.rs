/**
 * WebSocket Frames
 *
 * Every frame is a JSON object tagged by `type`.
 *
 * Inbound:
 *
 * ```json
 * {"type": "chat.send", "chatroomId": "…", "content": "hi"}
 * {"type": "chat.read", "chatroomId": "…", "messageId": "…"}
 * {"type": "chat.ai.init", "teamId": "t1"}
 * {"type": "subscribe", "topic": "room.<id>"}
 * {"type": "unsubscribe", "topic": "presence"}
 * ```
 *
 * Outbound: `event` (a hub event on a subscribed topic), `ack` (the result
 * of an inbound frame) and `error`.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::shared::chat::{MessageType, SendMessageRequest};
use crate::shared::RealtimeEvent;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendFrame {
    pub chatroom_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl ChatSendFrame {
    /// Send request on behalf of `sender_id`; the frame cannot choose the sender
    pub fn into_request(self, sender_id: &str, fallback_name: Option<&str>) -> SendMessageRequest {
        SendMessageRequest {
            chatroom_id: self.chatroom_id,
            sender_id: sender_id.to_string(),
            sender_name: self.sender_name.or_else(|| fallback_name.map(str::to_string)),
            message_type: self.message_type.unwrap_or_default(),
            content: self.content,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReadFrame {
    pub chatroom_id: Uuid,
    pub message_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiInitFrame {
    #[serde(default)]
    pub chatroom_id: Option<Uuid>,
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TopicFrame {
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "chat.send")]
    ChatSend(ChatSendFrame),
    #[serde(rename = "chat.read")]
    ChatRead(ChatReadFrame),
    #[serde(rename = "chat.ai.init")]
    AiInit(AiInitFrame),
    #[serde(rename = "subscribe")]
    Subscribe(TopicFrame),
    #[serde(rename = "unsubscribe")]
    Unsubscribe(TopicFrame),
}

impl InboundFrame {
    /// The `type` tag, used in acks and logs
    pub fn action(&self) -> &'static str {
        match self {
            InboundFrame::ChatSend(_) => "chat.send",
            InboundFrame::ChatRead(_) => "chat.read",
            InboundFrame::AiInit(_) => "chat.ai.init",
            InboundFrame::Subscribe(_) => "subscribe",
            InboundFrame::Unsubscribe(_) => "unsubscribe",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    Event { topic: String, event: RealtimeEvent },
    Ack { action: String, payload: Value },
    Error { message: String },
}

impl OutboundFrame {
    pub fn ack(action: &str, payload: Value) -> Self {
        OutboundFrame::Ack {
            action: action.to_string(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutboundFrame::Error {
            message: message.into(),
        }
    }
}
