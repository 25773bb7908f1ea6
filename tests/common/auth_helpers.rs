//! Authentication test helpers
//!
//! Tokens are signed with the same secret the test application verifies with.

use jsonwebtoken::{encode, EncodingKey, Header};
use teamchat::backend::auth::Claims;

pub const TEST_SECRET: &str = "teamchat-test-secret";

/// Generate a test JWT token for `user_id`
pub fn create_test_token(user_id: &str, name: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user_id.to_string(),
        username: name.map(str::to_string),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// A token signed with the wrong secret
pub fn create_foreign_token(user_id: &str) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user_id.to_string(),
        username: None,
        exp: now + 3600,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"someone-else"))
        .expect("Failed to sign test token")
}

/// `Authorization` header value for `user_id`
pub fn auth_header(user_id: &str) -> String {
    format!("Bearer {}", create_test_token(user_id, None))
}
