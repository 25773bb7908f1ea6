use serde::{Deserialize, Serialize};

/// Presence transition published on the global presence topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusMessage {
    pub user_id: String,
    pub online: bool,
}

impl UserStatusMessage {
    pub fn online(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            online: true,
        }
    }

    pub fn offline(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            online: false,
        }
    }
}

/// Response of the online-users listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsers {
    pub user_ids: Vec<String>,
}
