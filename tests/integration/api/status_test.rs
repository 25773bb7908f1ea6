//! Presence and team endpoints

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;

use teamchat::backend::analysis::MoodRecord;

use super::call;
use crate::common::TestApp;

#[tokio::test]
async fn test_online_users_and_logout() {
    let app = TestApp::new();
    app.state.presence.on_connected("s1", "bob").await;
    app.state.presence.on_connected("s2", "alice").await;

    let (status, online) = call(&app, Method::GET, "/api/v1/user-status/online-users", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(online["userIds"], json!(["alice", "bob"]));

    let (status, _) = call(&app, Method::DELETE, "/api/v1/user-status/logout", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!app.state.presence.is_online("alice").await);

    let (status, _) = call(&app, Method::DELETE, "/api/v1/user-status/bob", Some("carol"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, online) = call(&app, Method::GET, "/api/v1/user-status/online-users", Some("carol"), None).await;
    assert_eq!(online["userIds"], json!([]));
}

#[tokio::test]
async fn test_team_members_carry_latest_mood() {
    let app = TestApp::new();
    app.directory.insert_user("alice", "Alice");
    app.directory.insert_user("bob", "Bob");
    app.directory.add_team_member("team-3", "alice");
    app.directory.add_team_member("team-3", "bob");
    app.state.moods.record(MoodRecord {
        user_id: "bob".to_string(),
        mood_type: "tired".to_string(),
        intensity: 4,
        source_text: "long day".to_string(),
        analyzed_at: Utc::now(),
    });

    let (status, members) = call(&app, Method::GET, "/api/v1/teams/team-3/members", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        members,
        json!([
            { "userId": "alice", "name": "Alice", "latestMoodType": null, "latestMoodIntensity": null },
            { "userId": "bob", "name": "Bob", "latestMoodType": "tired", "latestMoodIntensity": 4 },
        ])
    );

    let (status, _) = call(&app, Method::GET, "/api/v1/teams/team-3/members", Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_roulette_announcement() {
    let app = TestApp::new();
    app.directory.add_team_member("team-5", "alice");

    let uri = "/api/v1/teams/team-5/roulette";
    let (status, _) = call(&app, Method::POST, uri, Some("alice"), Some(json!({ "result": "Kim" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(&app, Method::POST, "/api/v1/chatrooms/default?teamId=team-5", Some("alice"), None).await;

    let (status, _) = call(&app, Method::POST, uri, Some("alice"), Some(json!({ "result": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, message) = call(&app, Method::POST, uri, Some("alice"), Some(json!({ "result": "Kim" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["messageType"], "SYSTEM");
    assert_eq!(message["senderName"], app.state.config.ai_sender_name.as_str());
}
