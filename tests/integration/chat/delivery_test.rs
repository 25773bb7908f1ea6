//! Message delivery tests

use std::time::Duration;
use tokio::time::timeout;

use teamchat::backend::store::RoomStore;
use teamchat::backend::BackendError;
use teamchat::shared::chat::{MessageType, SendMessageRequest};
use teamchat::shared::{topics, ChatConfig, EventType};

use crate::common::{test_config, TestApp};
use crate::{assert_err, assert_ok};

/// Keeps cache scores of consecutive messages apart
async fn tick() {
    tokio::time::sleep(Duration::from_millis(3)).await;
}

#[tokio::test]
async fn test_send_persists_publishes_and_caches() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let mut rx = app.state.hub.subscribe(&topics::room(room.id));

    let delivered = assert_ok!(
        app.state
            .delivery
            .send(SendMessageRequest::text(room.id, "alice", "hello"))
            .await
    );
    let message = delivered.message;

    let stored = assert_ok!(app.state.delivery.get_message(message.id).await);
    assert_eq!(stored, message);

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("message event in time")
        .expect("open room channel");
    assert_eq!(event.event_type, EventType::Message);
    assert_eq!(event.payload["id"], message.id.to_string());

    let recent = assert_ok!(app.state.delivery.recent_cached(room.id).await);
    assert_eq!(recent, vec![message.clone()]);

    let saved = app.store.find_room(room.id).await.unwrap().unwrap();
    assert_eq!(saved.last_message.map(|m| m.id), Some(message.id));
}

#[tokio::test]
async fn test_sender_name_resolution() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    app.directory.insert_user("alice", "Alice");

    let from_directory = app.send(room.id, "alice", "hi").await;
    assert_eq!(from_directory.sender_name.as_deref(), Some("Alice"));

    let unknown = app.send(room.id, "bob", "hi").await;
    assert_eq!(
        unknown.sender_name.as_deref(),
        Some(app.state.config.unknown_sender_name.as_str())
    );

    let given = assert_ok!(
        app.state
            .delivery
            .send(SendMessageRequest::text(room.id, "bob", "hi").with_sender_name("Bobby"))
            .await
    );
    assert_eq!(given.message.sender_name.as_deref(), Some("Bobby"));
}

#[tokio::test]
async fn test_non_participant_and_invalid_sends_are_rejected() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;

    let outsider = app
        .state
        .delivery
        .send(SendMessageRequest::text(room.id, "mallory", "hi"))
        .await;
    assert_err!(outsider, BackendError::AccessDenied { .. });

    let blank = app
        .state
        .delivery
        .send(SendMessageRequest::text(room.id, "alice", "   "))
        .await;
    assert_err!(blank, BackendError::Shared(_));

    let missing_room = app
        .state
        .delivery
        .send(SendMessageRequest::text(uuid::Uuid::new_v4(), "alice", "hi"))
        .await;
    assert_err!(missing_room, BackendError::NotFound { .. });
}

#[tokio::test]
async fn test_cache_failure_does_not_fail_delivery() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    app.cache.set_failing(true);

    let message = app.send(room.id, "alice", "still delivered").await;
    assert_ok!(app.state.delivery.get_message(message.id).await);

    app.cache.set_failing(false);
    assert!(assert_ok!(app.state.delivery.recent_cached(room.id).await).is_empty());
}

#[tokio::test]
async fn test_recent_cache_is_bounded() {
    let config = ChatConfig {
        recent_message_capacity: 3,
        ..test_config()
    };
    let app = TestApp::with_config(config);
    let room = app.room(&["alice"]).await;

    let mut sent = Vec::new();
    for i in 0..5 {
        sent.push(app.send(room.id, "alice", &format!("message {}", i)).await);
        tick().await;
    }

    let recent = assert_ok!(app.state.delivery.recent_cached(room.id).await);
    let ids: Vec<_> = recent.iter().map(|m| m.id).collect();
    let newest: Vec<_> = sent[2..].iter().map(|m| m.id).collect();
    assert_eq!(ids, newest);
}

#[tokio::test]
async fn test_recent_cache_default_capacity_evicts_oldest() {
    let app = TestApp::with_config(ChatConfig::default());
    assert_eq!(app.state.config.recent_message_capacity, 100);
    let room = app.room(&["alice"]).await;

    let mut sent = Vec::new();
    for i in 0..101 {
        sent.push(app.send(room.id, "alice", &format!("message {}", i)).await);
        tick().await;
    }

    let recent = assert_ok!(app.state.delivery.recent_cached(room.id).await);
    assert_eq!(recent.len(), 100);
    assert!(recent.iter().all(|m| m.id != sent[0].id));
    assert_eq!(recent.first().map(|m| m.id), Some(sent[1].id));
    assert_eq!(recent.last().map(|m| m.id), Some(sent[100].id));
}

#[tokio::test]
async fn test_paging_newest_first() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;

    let mut sent = Vec::new();
    for i in 0..5 {
        sent.push(app.send(room.id, "alice", &format!("message {}", i)).await);
        tick().await;
    }

    let first = assert_ok!(app.state.delivery.page(room.id, 0, 2).await);
    assert_eq!(first.messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![sent[4].id, sent[3].id]);
    assert!(first.has_more);

    let last = assert_ok!(app.state.delivery.page(room.id, 2, 2).await);
    assert_eq!(last.messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![sent[0].id]);
    assert!(!last.has_more);

    let before = assert_ok!(app.state.delivery.messages_before(room.id, sent[2].id, 10).await);
    assert_eq!(before.iter().map(|m| m.id).collect::<Vec<_>>(), vec![sent[1].id, sent[0].id]);

    let after = assert_ok!(app.state.delivery.messages_after(room.id, sent[2].id, 10).await);
    assert_eq!(after.iter().map(|m| m.id).collect::<Vec<_>>(), vec![sent[3].id, sent[4].id]);
}

#[tokio::test]
async fn test_delete_is_sender_only_and_hides_from_history() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "oops").await;
    let mut rx = app.state.hub.subscribe(&topics::room_delete(room.id));

    assert_err!(
        app.state.delivery.delete(message.id, "bob").await,
        BackendError::AccessDenied { .. }
    );

    let deleted = assert_ok!(app.state.delivery.delete(message.id, "alice").await);
    assert!(deleted.is_deleted());

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("delete event in time")
        .expect("open delete channel");
    assert_eq!(event.event_type, EventType::MessageDeleted);
    assert_eq!(event.payload["messageId"], message.id.to_string());

    let page = assert_ok!(app.state.delivery.page(room.id, 0, 20).await);
    assert!(page.messages.is_empty());
}

#[tokio::test]
async fn test_roulette_result_lands_in_default_room() {
    let app = TestApp::new();
    app.directory.add_team_member("team-9", "alice");

    assert_err!(
        app.state.delivery.send_roulette_result("team-9", "Kim pays").await,
        BackendError::NotFound { .. }
    );

    let room = assert_ok!(app.state.rooms.create_default_room("team-9", "General", "alice").await);
    let delivered = assert_ok!(app.state.delivery.send_roulette_result("team-9", "Kim pays").await);
    assert_eq!(delivered.room.id, room.id);
    assert_eq!(delivered.message.message_type, MessageType::System);
    assert!(app.state.config.is_ai_sender(&delivered.message.sender_id));
    assert!(delivered.message.content.contains("Kim pays"));
}
