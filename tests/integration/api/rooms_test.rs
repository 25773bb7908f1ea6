//! Room and message history endpoints

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use super::call;
use crate::common::{create_foreign_token, create_test_token, TestApp};

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let app = TestApp::new();

    let (status, body) = call(&app, Method::GET, "/api/v1/chatrooms", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let uri = format!("/api/v1/chatrooms?token={}", create_foreign_token("alice"));
    let (status, _) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/api/v1/chatrooms?token={}", create_test_token("alice", None));
    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_health_reports_cache_state() {
    let app = TestApp::new();

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    app.cache.set_failing(true);
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_create_and_list_rooms() {
    let app = TestApp::new();

    let (status, room) = call(
        &app,
        Method::POST,
        "/api/v1/chatrooms",
        Some("alice"),
        Some(json!({ "teamId": "team-1", "name": "design", "type": "TEAM", "participantIds": ["bob"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["name"], "design");
    let members: Vec<&str> = room["participants"]
        .as_array()
        .expect("participants")
        .iter()
        .filter_map(|p| p["userId"].as_str())
        .collect();
    assert_eq!(members, vec!["alice", "bob"]);

    let room_id: Uuid = serde_json::from_value(room["id"].clone()).unwrap();
    app.send(room_id, "alice", "welcome").await;

    let (status, listed) = call(&app, Method::GET, "/api/v1/chatrooms?teamId=team-1", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], room["id"]);
    assert_eq!(listed[0]["unreadCount"], 1);

    let (status, listed) = call(&app, Method::GET, "/api/v1/chatrooms", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/chatrooms",
        Some("alice"),
        Some(json!({ "name": "  ", "type": "TEAM" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_default_room_is_created_once_per_team() {
    let app = TestApp::new();
    app.directory.add_team_member("team-7", "alice");
    app.directory.add_team_member("team-7", "bob");

    let (status, _) = call(&app, Method::POST, "/api/v1/chatrooms/default", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = call(&app, Method::POST, "/api/v1/chatrooms/default?teamId=team-7", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["isDefault"], true);
    assert_eq!(first["name"], "General");
    assert_eq!(first["participants"].as_array().map(Vec::len), Some(2));

    let (_, second) = call(
        &app,
        Method::POST,
        "/api/v1/chatrooms/default?teamId=team-7&name=Other",
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(second["id"], first["id"]);
}

#[tokio::test]
async fn test_history_requires_membership() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    for i in 0..3 {
        app.send(room.id, "alice", &format!("m{}", i)).await;
    }

    let uri = format!("/api/v1/chatrooms/{}/messages?page=0&size=2", room.id);
    let (status, page) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["messages"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["hasMore"], true);

    let (status, _) = call(&app, Method::GET, &uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/api/v1/chatrooms/{}/messages", Uuid::new_v4());
    let (status, body) = call(&app, Method::GET, &missing, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_single_message_fetch_and_delete() {
    let app = TestApp::new();
    let room = app.room(&["alice", "bob"]).await;
    let message = app.send(room.id, "alice", "to be removed").await;
    let uri = format!("/api/v1/messages/{}", message.id);

    let (status, fetched) = call(&app, Method::GET, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["content"], "to be removed");

    let (status, _) = call(&app, Method::GET, &uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, deleted) = call(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!deleted["deletedAt"].is_null());
}

#[tokio::test]
async fn test_participants_and_notifications() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;

    let add = format!("/api/v1/chatrooms/{}/participants?userId=bob", room.id);
    let (status, _) = call(&app, Method::POST, &add, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, updated) = call(&app, Method::POST, &add, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["participants"].as_array().map(Vec::len), Some(2));

    let toggle = format!("/api/v1/chatrooms/{}/notification/toggle", room.id);
    let (status, setting) = call(&app, Method::PUT, &toggle, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(setting["notificationEnabled"], false);

    let get = format!("/api/v1/chatrooms/{}/notification", room.id);
    let (_, setting) = call(&app, Method::GET, &get, Some("bob"), None).await;
    assert_eq!(setting["notificationEnabled"], false);

    let (status, all) = call(&app, Method::GET, "/api/v1/chatrooms/notifications", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all[0]["chatroomId"], room.id.to_string());

    let remove = format!("/api/v1/chatrooms/{}/participants/bob", room.id);
    let (status, _) = call(&app, Method::DELETE, &remove, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let history = format!("/api/v1/chatrooms/{}/messages", room.id);
    let (status, _) = call(&app, Method::GET, &history, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_room() {
    let app = TestApp::new();
    let room = app.room(&["alice"]).await;
    let uri = format!("/api/v1/chatrooms/{}", room.id);

    let (status, _) = call(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let history = format!("/api/v1/chatrooms/{}/messages", room.id);
    let (status, _) = call(&app, Method::GET, &history, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
