/**
 * User Directory
 *
 * Narrow view of the account service: resolve a display name for a user id
 * and list a team's members. Users and teams are owned elsewhere; this
 * module only reads them.
 */

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::backend::store::StoreResult;

/// A team member as listed by the directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub user_id: String,
    pub name: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Display name of a user, `None` when unknown
    async fn display_name(&self, user_id: &str) -> StoreResult<Option<String>>;

    async fn team_members(&self, team_id: &str) -> StoreResult<Vec<TeamMember>>;
}

/// Reads the account service's `users` and `team_members` tables
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn display_name(&self, user_id: &str) -> StoreResult<Option<String>> {
        let name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT user_name FROM users WHERE id::TEXT = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }

    async fn team_members(&self, team_id: &str) -> StoreResult<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT u.id::TEXT AS user_id, u.user_name AS name
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id::TEXT = $1
            ORDER BY u.user_name ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}

/// In-memory directory for development and tests
#[derive(Clone, Default)]
pub struct StaticUserDirectory {
    names: Arc<DashMap<String, String>>,
    teams: Arc<DashMap<String, Vec<String>>>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(user_id.into(), name.into());
    }

    pub fn add_team_member(&self, team_id: impl Into<String>, user_id: impl Into<String>) {
        self.teams.entry(team_id.into()).or_default().push(user_id.into());
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn display_name(&self, user_id: &str) -> StoreResult<Option<String>> {
        Ok(self.names.get(user_id).map(|name| name.value().clone()))
    }

    async fn team_members(&self, team_id: &str) -> StoreResult<Vec<TeamMember>> {
        let ids = self
            .teams
            .get(team_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        Ok(ids
            .into_iter()
            .map(|user_id| {
                let name = self
                    .names
                    .get(&user_id)
                    .map(|name| name.value().clone())
                    .unwrap_or_else(|| user_id.clone());
                TeamMember { user_id, name }
            })
            .collect())
    }
}
