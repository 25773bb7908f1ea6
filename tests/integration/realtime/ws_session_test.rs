//! WebSocket session tests
//!
//! Sessions are driven through their outbound channel; no socket involved.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use teamchat::backend::middleware::AuthenticatedUser;
use teamchat::backend::presence::DisconnectOutcome;
use teamchat::backend::ws::{OutboundFrame, WsSession};
use teamchat::shared::{topics, EventType};

use crate::assert_contains;
use crate::common::TestApp;

fn principal(user_id: &str) -> Option<AuthenticatedUser> {
    Some(AuthenticatedUser {
        user_id: user_id.to_string(),
        name: None,
    })
}

async fn open(app: &TestApp, session_id: &str, user: Option<AuthenticatedUser>) -> (WsSession, mpsc::Receiver<OutboundFrame>) {
    let (tx, rx) = mpsc::channel(64);
    let session = WsSession::open(session_id.to_string(), user, app.state.clone(), tx).await;
    (session, rx)
}

async fn next_frame(rx: &mut mpsc::Receiver<OutboundFrame>) -> OutboundFrame {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame in time")
        .expect("open outbound queue")
}

fn expect_ack(frame: OutboundFrame, expected: &str) -> serde_json::Value {
    match frame {
        OutboundFrame::Ack { action, payload } => {
            assert_eq!(action, expected);
            payload
        }
        other => panic!("expected {} ack, got {:?}", expected, other),
    }
}

fn expect_error(frame: OutboundFrame) -> String {
    match frame {
        OutboundFrame::Error { message } => message,
        other => panic!("expected error frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_is_acked_and_fanned_out_to_subscribers() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    app.directory.insert_user("alice", "Alice");

    let (mut alice, mut alice_rx) = open(&app, "a1", principal("alice")).await;
    let (mut bob, mut bob_rx) = open(&app, "b1", principal("bob")).await;

    let topic = topics::room(room.id);
    bob.handle_text(&format!(r#"{{"type":"subscribe","topic":"{}"}}"#, topic))
        .await;
    let ack = expect_ack(next_frame(&mut bob_rx).await, "subscribe");
    assert_eq!(ack["topic"], topic.as_str());
    assert_eq!(bob.subscribed_topics(), vec![topic.clone()]);

    alice
        .handle_text(&format!(
            r#"{{"type":"chat.send","chatroomId":"{}","content":"hello bob"}}"#,
            room.id
        ))
        .await;
    let sent = expect_ack(next_frame(&mut alice_rx).await, "chat.send");
    assert_eq!(sent["content"], "hello bob");
    assert_eq!(sent["senderId"], "alice");
    assert_eq!(sent["senderName"], "Alice");

    match next_frame(&mut bob_rx).await {
        OutboundFrame::Event { topic: got, event } => {
            assert_eq!(got, topic);
            assert_eq!(event.event_type, EventType::Message);
            assert_eq!(event.payload["id"], sent["id"]);
        }
        other => panic!("expected event frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sender_cannot_be_spoofed() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let (mut alice, mut rx) = open(&app, "a1", principal("alice")).await;

    alice
        .handle_text(&format!(
            r#"{{"type":"chat.send","chatroomId":"{}","content":"hi","senderId":"bob"}}"#,
            room.id
        ))
        .await;
    let sent = expect_ack(next_frame(&mut rx).await, "chat.send");
    assert_eq!(sent["senderId"], "alice");
}

#[tokio::test]
async fn test_system_messages_are_rejected() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let (mut alice, mut rx) = open(&app, "a1", principal("alice")).await;

    alice
        .handle_text(&format!(
            r#"{{"type":"chat.send","chatroomId":"{}","content":"x","messageType":"SYSTEM"}}"#,
            room.id
        ))
        .await;
    let message = expect_error(next_frame(&mut rx).await);
    assert_contains!(message, "system");
}

#[tokio::test]
async fn test_non_member_cannot_send_or_subscribe() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let (mut mallory, mut rx) = open(&app, "m1", principal("mallory")).await;

    mallory
        .handle_text(&format!(
            r#"{{"type":"chat.send","chatroomId":"{}","content":"let me in"}}"#,
            room.id
        ))
        .await;
    expect_error(next_frame(&mut rx).await);

    mallory
        .handle_text(&format!(r#"{{"type":"subscribe","topic":"{}"}}"#, topics::room(room.id)))
        .await;
    expect_error(next_frame(&mut rx).await);
    assert!(mallory.subscribed_topics().is_empty());

    mallory
        .handle_text(r#"{"type":"subscribe","topic":"somewhere.else"}"#)
        .await;
    let message = expect_error(next_frame(&mut rx).await);
    assert_contains!(message, "unknown topic");
}

#[tokio::test]
async fn test_malformed_frame_gets_error() {
    let app = TestApp::new();
    let (mut alice, mut rx) = open(&app, "a1", principal("alice")).await;

    alice.handle_text("{not json").await;
    let message = expect_error(next_frame(&mut rx).await);
    assert_contains!(message, "malformed frame");

    alice.handle_text(r#"{"type":"chat.teleport"}"#).await;
    expect_error(next_frame(&mut rx).await);
}

#[tokio::test]
async fn test_unauthenticated_session_is_refused() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let (mut anon, mut rx) = open(&app, "anon", None).await;
    assert!(anon.user().is_none());

    anon.handle_text(&format!(
        r#"{{"type":"chat.send","chatroomId":"{}","content":"hi"}}"#,
        room.id
    ))
    .await;
    assert_eq!(expect_error(next_frame(&mut rx).await), "unauthenticated session");
    assert_eq!(anon.close(), DisconnectOutcome::UnknownSession);
}

#[tokio::test]
async fn test_read_frame_publishes_read_status() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "read me").await;
    let mut read_rx = app.state.hub.subscribe(&topics::room_read(room.id));

    let (mut bob, mut rx) = open(&app, "b1", principal("bob")).await;
    bob.handle_text(&format!(
        r#"{{"type":"chat.read","chatroomId":"{}","messageId":"{}"}}"#,
        room.id, message.id
    ))
    .await;

    let receipt = expect_ack(next_frame(&mut rx).await, "chat.read");
    assert_eq!(receipt["userId"], "bob");

    let event = timeout(Duration::from_secs(5), read_rx.recv())
        .await
        .expect("read event in time")
        .expect("open read channel");
    assert_eq!(event.event_type, EventType::ReadStatus);
    assert_eq!(event.payload["lastReadMessageId"], message.id.to_string());
}

#[tokio::test]
async fn test_unsubscribe_reports_whether_removed() {
    let app = TestApp::new();
    let (mut alice, mut rx) = open(&app, "a1", principal("alice")).await;

    alice.handle_text(r#"{"type":"subscribe","topic":"presence"}"#).await;
    expect_ack(next_frame(&mut rx).await, "subscribe");

    alice.handle_text(r#"{"type":"unsubscribe","topic":"presence"}"#).await;
    let ack = expect_ack(next_frame(&mut rx).await, "unsubscribe");
    assert_eq!(ack["removed"], true);

    alice.handle_text(r#"{"type":"unsubscribe","topic":"presence"}"#).await;
    let ack = expect_ack(next_frame(&mut rx).await, "unsubscribe");
    assert_eq!(ack["removed"], false);
}

#[tokio::test]
async fn test_ai_init_creates_room_and_subscribes() {
    let app = TestApp::new();
    let (mut alice, mut rx) = open(&app, "a1", principal("alice")).await;

    alice
        .handle_text(r#"{"type":"chat.ai.init","teamId":"team-1"}"#)
        .await;
    let ack = expect_ack(next_frame(&mut rx).await, "chat.ai.init");
    let room_id: Uuid = serde_json::from_value(ack["room"]["id"].clone()).expect("room id");
    assert_eq!(ack["room"]["type"], "AI");
    assert_eq!(ack["message"]["senderId"], app.state.config.ai_sender_id.as_str());
    assert_eq!(alice.subscribed_topics(), vec![topics::room(room_id)]);
}

#[tokio::test]
async fn test_close_schedules_offline() {
    let app = TestApp::new();
    let (alice, _rx) = open(&app, "a1", principal("alice")).await;
    assert!(app.state.presence.is_online("alice").await);
    assert_eq!(alice.close(), DisconnectOutcome::OfflineScheduled);
}
