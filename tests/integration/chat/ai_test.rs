//! AI session tests

use std::time::Duration;

use teamchat::backend::analysis::AI_GREETING;
use teamchat::backend::BackendError;
use teamchat::shared::chat::{ChatRoomType, SendMessageRequest};

use crate::common::{eventually, TestApp};
use crate::{assert_err, assert_ok};

#[tokio::test]
async fn test_init_session_greets_in_personal_room() {
    let app = TestApp::new();

    let first = assert_ok!(app.state.ai_chat.init_session("alice", None, Some("team-1")).await);
    assert_eq!(first.room.room_type, ChatRoomType::Ai);
    assert_eq!(first.room.owner_id.as_deref(), Some("alice"));
    assert_eq!(first.message.content, AI_GREETING);
    assert!(app.state.config.is_ai_sender(&first.message.sender_id));

    let again = assert_ok!(app.state.ai_chat.init_session("alice", None, Some("team-1")).await);
    assert_eq!(again.room.id, first.room.id);

    let explicit = assert_ok!(
        app.state
            .ai_chat
            .init_session("alice", Some(first.room.id), None)
            .await
    );
    assert_eq!(explicit.room.id, first.room.id);
}

#[tokio::test]
async fn test_init_session_rejects_other_rooms() {
    let app = TestApp::new();
    let team_room = app.room(&["alice"]).await;

    assert_err!(
        app.state.ai_chat.init_session("alice", Some(team_room.id), None).await,
        BackendError::Validation { .. }
    );

    let ai = assert_ok!(app.state.ai_chat.init_session("alice", None, Some("team-1")).await);
    assert_err!(
        app.state.ai_chat.init_session("bob", Some(ai.room.id), None).await,
        BackendError::AccessDenied { .. }
    );
}

#[tokio::test]
async fn test_user_message_in_ai_room_gets_reply() {
    let app = TestApp::new();
    let session = assert_ok!(app.state.ai_chat.init_session("alice", None, None).await);

    let delivered = assert_ok!(
        app.state
            .delivery
            .send(SendMessageRequest::text(session.room.id, "alice", "I had a long day"))
            .await
    );
    assert!(app.state.ai_chat.on_delivered(&delivered.room, &delivered.message));

    let delivery = app.state.delivery.clone();
    let room_id = session.room.id;
    assert!(eventually(Duration::from_secs(5), || {
        let delivery = delivery.clone();
        async move {
            match delivery.page(room_id, 0, 10).await {
                Ok(page) => page.messages.iter().any(|m| m.content == "echo: I had a long day"),
                Err(_) => false,
            }
        }
    })
    .await);
    assert_eq!(app.responder.calls(), 1);
}

#[tokio::test]
async fn test_no_reply_outside_ai_rooms_or_to_itself() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let delivered = assert_ok!(
        app.state
            .delivery
            .send(SendMessageRequest::text(room.id, "alice", "hello team"))
            .await
    );
    assert!(!app.state.ai_chat.on_delivered(&delivered.room, &delivered.message));

    let session = assert_ok!(app.state.ai_chat.init_session("alice", None, None).await);
    assert!(!app.state.ai_chat.on_delivered(&session.room, &session.message));
    assert_eq!(app.responder.calls(), 0);
}
