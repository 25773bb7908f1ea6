/**
 * Mood Analyzer
 *
 * Client side of the external emotion-analysis service plus the in-process
 * history of results. The chat core never depends on the analyzer being up:
 * every call site treats an error or an empty result as "no mood".
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to an external analysis collaborator
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed: {status} - {body}")]
    Status { status: u16, body: String },
}

/// What the analyzer concluded about a piece of text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodResult {
    pub mood_type: String,
    pub intensity: u8,
}

/// A stored analysis for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub user_id: String,
    pub mood_type: String,
    pub intensity: u8,
    /// Text the analysis was run on
    pub source_text: String,
    pub analyzed_at: DateTime<Utc>,
}

#[async_trait]
pub trait MoodAnalyzer: Send + Sync {
    /// Analyze `text`. `Ok(None)` means the analyzer had nothing to say.
    async fn analyze(&self, text: &str) -> Result<Option<MoodResult>, AnalysisError>;
}

/// POSTs `{"text": ...}` to an analysis endpoint
pub struct HttpMoodAnalyzer {
    client: Client,
    endpoint: String,
}

impl HttpMoodAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl MoodAnalyzer for HttpMoodAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Option<MoodResult>, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = response.json::<MoodResult>().await?;
        if result.mood_type.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(result))
    }
}

/// Used when no analysis endpoint is configured
pub struct DisabledMoodAnalyzer;

#[async_trait]
impl MoodAnalyzer for DisabledMoodAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Option<MoodResult>, AnalysisError> {
        tracing::debug!("[Analysis] Analyzer disabled, skipping {} chars", text.len());
        Ok(None)
    }
}

/// Bounded per-user history of mood records, newest last
#[derive(Clone)]
pub struct MoodHistoryStore {
    records: Arc<DashMap<String, VecDeque<MoodRecord>>>,
    per_user: usize,
}

impl MoodHistoryStore {
    pub fn new(per_user: usize) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            per_user: per_user.max(1),
        }
    }

    pub fn record(&self, record: MoodRecord) {
        let mut entries = self.records.entry(record.user_id.clone()).or_default();
        entries.push_back(record);
        while entries.len() > self.per_user {
            entries.pop_front();
        }
    }

    pub fn latest(&self, user_id: &str) -> Option<MoodRecord> {
        self.records
            .get(user_id)
            .and_then(|entries| entries.back().cloned())
    }

    /// Every kept record of a user, oldest first
    pub fn history(&self, user_id: &str) -> Vec<MoodRecord> {
        self.records
            .get(user_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MoodHistoryStore {
    fn default() -> Self {
        Self::new(50)
    }
}
