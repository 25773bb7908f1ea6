//! Application fixtures
//!
//! `TestApp` builds the full service graph over in-memory backends and keeps
//! handles on the doubles so tests can inject failures.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use teamchat::backend::auth::{StaticUserDirectory, TokenVerifier};
use teamchat::backend::routes::create_router;
use teamchat::backend::server::{AppState, Collaborators};
use teamchat::backend::store::RoomStore;
use teamchat::shared::chat::{ChatMessage, ChatRoom, ChatRoomType, SendMessageRequest};
use teamchat::shared::ChatConfig;

use super::auth_helpers::TEST_SECRET;
use super::doubles::{EchoResponder, FailingCache, FlakyStore, RecordingAnalyzer};

/// Settle delay used by the fixtures
pub const TEST_SETTLE: Duration = Duration::from_millis(50);

pub fn test_config() -> ChatConfig {
    ChatConfig::builder()
        .presence_settle_delay(TEST_SETTLE)
        .build()
        .expect("valid test config")
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<FlakyStore>,
    pub cache: Arc<FailingCache>,
    pub directory: StaticUserDirectory,
    pub analyzer: Arc<RecordingAnalyzer>,
    pub responder: Arc<EchoResponder>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Must be called inside a Tokio runtime
    pub fn with_config(config: ChatConfig) -> Self {
        let store = Arc::new(FlakyStore::new());
        let cache = Arc::new(FailingCache::new());
        let directory = StaticUserDirectory::new();
        let analyzer = Arc::new(RecordingAnalyzer::default());
        let responder = Arc::new(EchoResponder::default());

        let state = AppState::build(
            config,
            Collaborators {
                store: store.clone(),
                cache: cache.clone(),
                directory: Arc::new(directory.clone()),
                analyzer: analyzer.clone(),
                responder: responder.clone(),
                verifier: TokenVerifier::new(TEST_SECRET),
            },
        );

        Self {
            state,
            store,
            cache,
            directory,
            analyzer,
            responder,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Insert a team room with the given participants
    pub async fn room(&self, participants: &[&str]) -> ChatRoom {
        self.room_of_type(ChatRoomType::Team, participants).await
    }

    pub async fn room_of_type(&self, room_type: ChatRoomType, participants: &[&str]) -> ChatRoom {
        let mut room = ChatRoom::new(Some("team-1".to_string()), "general", room_type);
        for user_id in participants {
            room.add_participant(user_id);
        }
        self.store.insert_room(&room).await.expect("insert room");
        room
    }

    /// Deliver a text message through the delivery service
    pub async fn send(&self, chatroom_id: Uuid, sender_id: &str, content: &str) -> ChatMessage {
        self.state
            .delivery
            .send(SendMessageRequest::text(chatroom_id, sender_id, content))
            .await
            .expect("send message")
            .message
    }
}

/// Poll `check` until it holds or `within` elapses
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
