//! Mood analysis trigger tests

use std::time::Duration;

use teamchat::backend::cache::EphemeralCache;
use teamchat::shared::chat::MessageType;

use crate::assert_ok;
use crate::common::{eventually, TestApp};

async fn tick() {
    tokio::time::sleep(Duration::from_millis(3)).await;
}

#[tokio::test]
async fn test_every_fifth_message_is_analyzed() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;

    for i in 0..5 {
        app.send(room.id, "alice", &format!("m{}", i)).await;
        tick().await;
    }

    let analyzer = app.analyzer.clone();
    assert!(eventually(Duration::from_secs(5), || {
        let analyzer = analyzer.clone();
        async move { analyzer.texts().len() == 1 }
    })
    .await);
    assert_eq!(app.analyzer.texts(), vec!["m0 m1 m2 m3 m4".to_string()]);

    let moods = app.state.moods.clone();
    assert!(eventually(Duration::from_secs(5), || {
        let moods = moods.clone();
        async move { moods.latest("alice").is_some() }
    })
    .await);
    let mood = app.state.moods.latest("alice").expect("recorded mood");
    assert_eq!(mood.mood_type, "happy");
    assert_eq!(mood.intensity, 7);

    let count = app.cache.message_count("alice", room.id).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_counts_are_per_user_and_room() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let other = app.room(&["alice"]).await;

    for i in 0..3 {
        app.send(room.id, "alice", &format!("a{}", i)).await;
        app.send(room.id, "bob", &format!("b{}", i)).await;
        app.send(other.id, "alice", &format!("o{}", i)).await;
    }

    let cache = app.cache.clone();
    let (room_id, other_id) = (room.id, other.id);
    assert!(eventually(Duration::from_secs(5), || {
        let cache = cache.clone();
        async move {
            let counts = [
                cache.message_count("alice", room_id).await.unwrap_or(0),
                cache.message_count("bob", room_id).await.unwrap_or(0),
                cache.message_count("alice", other_id).await.unwrap_or(0),
            ];
            counts == [3, 3, 3]
        }
    })
    .await);
    assert!(app.analyzer.texts().is_empty());
}

#[tokio::test]
async fn test_assistant_messages_are_not_counted() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;

    for _ in 0..6 {
        assert_ok!(
            app.state
                .delivery
                .send_as_ai(room.id, "beep", MessageType::Text)
                .await
        );
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let ai_id = app.state.config.ai_sender_id.clone();
    assert_eq!(app.cache.message_count(&ai_id, room.id).await.unwrap(), 0);
    assert!(app.analyzer.texts().is_empty());
}
