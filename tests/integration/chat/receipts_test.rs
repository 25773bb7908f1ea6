//! Read receipt tests
//!
//! A read is recorded on up to three paths: the durable receipt, the cache
//! pointer and the participant pointer. The call fails only when none of
//! them could be written.

use std::time::Duration;

use teamchat::backend::cache::EphemeralCache;
use teamchat::backend::BackendError;

use crate::common::TestApp;
use crate::{assert_err, assert_ok};

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    let first = assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);

    assert_eq!(first, second);
    let receipts = assert_ok!(app.state.receipts.get_receipts(message.id).await);
    assert_eq!(receipts.len(), 1);
}

#[tokio::test]
async fn test_durable_failure_falls_back_to_cache_pointer() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    app.store.fail_receipts(true);
    let receipt = assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);
    assert_eq!(receipt.message_id, message.id);

    let pointer = app.cache.last_read(room.id, "bob").await.unwrap();
    assert_eq!(pointer, Some(message.id));
}

#[tokio::test]
async fn test_durable_and_cache_failure_falls_back_to_participant_pointer() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    app.store.fail_receipts(true);
    app.cache.set_failing(true);
    assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);

    let reloaded = assert_ok!(app.state.rooms.get_room(room.id).await);
    let bob = reloaded.participant("bob").expect("bob participates");
    assert_eq!(bob.last_read_message_id, Some(message.id));
}

#[tokio::test]
async fn test_every_path_failing_is_full_failure() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    app.store.fail_receipts(true);
    app.store.fail_participants(true);
    app.cache.set_failing(true);

    assert_err!(
        app.state.receipts.mark_read(room.id, message.id, "bob").await,
        BackendError::FullFailure { .. }
    );
}

#[tokio::test]
async fn test_non_participant_fallback_is_full_failure() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    app.store.fail_receipts(true);
    app.cache.set_failing(true);

    assert_err!(
        app.state.receipts.mark_read(room.id, message.id, "mallory").await,
        BackendError::FullFailure { .. }
    );
}

#[tokio::test]
async fn test_cache_failure_alone_still_stores_receipt() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "hi").await;

    app.cache.set_failing(true);
    assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);
    let receipts = assert_ok!(app.state.receipts.get_receipts(message.id).await);
    assert_eq!(receipts.len(), 1);
}

#[tokio::test]
async fn test_unread_count_follows_receipts() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;

    assert_eq!(assert_ok!(app.state.receipts.unread_count(room.id, "bob").await), 0);
    assert!(assert_ok!(app.state.receipts.mark_all_read(room.id, "bob").await).is_none());

    app.send(room.id, "alice", "one").await;
    app.send(room.id, "alice", "two").await;
    assert_eq!(assert_ok!(app.state.receipts.unread_count(room.id, "bob").await), 2);

    let receipt = assert_ok!(app.state.receipts.mark_all_read(room.id, "bob").await);
    assert!(receipt.is_some());
    assert_eq!(assert_ok!(app.state.receipts.unread_count(room.id, "bob").await), 0);

    tokio::time::sleep(Duration::from_millis(5)).await;
    app.send(room.id, "alice", "three").await;
    assert_eq!(assert_ok!(app.state.receipts.unread_count(room.id, "bob").await), 1);
}

#[tokio::test]
async fn test_message_read_status_and_room_summary() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob", "carol"]).await;
    let message = app.send(room.id, "alice", "roll call").await;

    assert_ok!(app.state.receipts.mark_read(room.id, message.id, "bob").await);

    let status = assert_ok!(app.state.receipts.message_read_status(room.id, message.id).await);
    assert_eq!(status.read_count, 1);
    assert_eq!(status.read_users[0].user_id, "bob");
    assert_eq!(status.unread_count, 2);

    let summary = assert_ok!(app.state.rooms.read_summary(room.id).await);
    assert_eq!(summary.last_message_id, Some(message.id));
    assert!(!summary.read_by_all);
    assert!(summary.unread_user_ids.contains(&"carol".to_string()));

    for user in ["alice", "carol"] {
        assert_ok!(app.state.receipts.mark_read(room.id, message.id, user).await);
    }
    let summary = assert_ok!(app.state.rooms.read_summary(room.id).await);
    assert!(summary.read_by_all);
    assert_eq!(summary.read_count, 3);
}
