/**
 * Analysis Trigger
 *
 * Counts a user's messages per room in the cache and, every
 * `analysis_trigger_count` messages, hands a snapshot of the user's recent
 * messages in that room to the analysis worker.
 *
 * The counter lives in the cache under `chat:message_count:<user>:<room>`
 * with a 24 hour expiry set on its first increment. The hand-off is a
 * bounded channel; a full queue drops the task with a warning so the
 * sender is never slowed down.
 */

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::analyzer::{MoodAnalyzer, MoodHistoryStore, MoodRecord};
use crate::backend::cache::EphemeralCache;
use crate::backend::store::ChatStore;
use crate::shared::chat::{ChatMessage, MessageType};
use crate::shared::ChatConfig;

/// How far back the snapshot query looks, in multiples of the threshold
const SNAPSHOT_WINDOW_FACTOR: u64 = 10;

/// Queue depth between the trigger and the worker
pub const ANALYSIS_QUEUE_CAPACITY: usize = 256;

/// Recent messages of one user in one room, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisTask {
    pub user_id: String,
    pub chatroom_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

impl AnalysisTask {
    pub fn combined_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What the trigger did with one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// System or AI message, or an empty one
    Skipped,
    /// Counter incremented to the given value
    Counted(u64),
    /// Threshold reached: counter reset and a task with this many messages queued
    Enqueued(usize),
    /// Counting or snapshotting failed; nothing was queued
    Failed,
}

#[derive(Clone)]
pub struct AnalysisTrigger {
    cache: Arc<dyn EphemeralCache>,
    store: Arc<dyn ChatStore>,
    tasks: mpsc::Sender<AnalysisTask>,
    threshold: u64,
    counter_ttl: Duration,
    ai_sender_id: String,
}

impl AnalysisTrigger {
    pub fn new(
        cache: Arc<dyn EphemeralCache>,
        store: Arc<dyn ChatStore>,
        tasks: mpsc::Sender<AnalysisTask>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            cache,
            store,
            tasks,
            threshold: config.analysis_trigger_count,
            counter_ttl: config.message_counter_ttl,
            ai_sender_id: config.ai_sender_id.clone(),
        }
    }

    fn counts(&self, message: &ChatMessage) -> bool {
        message.message_type != MessageType::System
            && message.sender_id != self.ai_sender_id
            && !message.content.trim().is_empty()
    }

    /// Account for one delivered message
    pub async fn on_message(&self, message: &ChatMessage) -> TriggerOutcome {
        if !self.counts(message) {
            return TriggerOutcome::Skipped;
        }

        let user_id = message.sender_id.as_str();
        let chatroom_id = message.chatroom_id;

        let count = match self
            .cache
            .increment_message_count(user_id, chatroom_id, self.counter_ttl)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!("[Analysis] Counter increment failed for {} in {}: {}", user_id, chatroom_id, e);
                return TriggerOutcome::Failed;
            }
        };
        debug!("[Analysis] {} has {} messages in {}", user_id, count, chatroom_id);

        if count < self.threshold {
            return TriggerOutcome::Counted(count);
        }

        info!("[Analysis] {} reached {} messages in {}", user_id, self.threshold, chatroom_id);
        if let Err(e) = self.cache.reset_message_count(user_id, chatroom_id).await {
            warn!("[Analysis] Counter reset failed for {} in {}: {}", user_id, chatroom_id, e);
        }

        let messages = match self.recent_user_messages(user_id, chatroom_id).await {
            Ok(messages) if !messages.is_empty() => messages,
            Ok(_) => {
                warn!("[Analysis] No recent messages for {} in {}", user_id, chatroom_id);
                return TriggerOutcome::Failed;
            }
            Err(e) => {
                warn!("[Analysis] Snapshot failed for {} in {}: {}", user_id, chatroom_id, e);
                return TriggerOutcome::Failed;
            }
        };

        let size = messages.len();
        let task = AnalysisTask {
            user_id: user_id.to_string(),
            chatroom_id,
            messages,
        };
        match self.tasks.try_send(task) {
            Ok(()) => TriggerOutcome::Enqueued(size),
            Err(e) => {
                warn!("[Analysis] Dropping analysis task for {}: {}", user_id, e);
                TriggerOutcome::Failed
            }
        }
    }

    async fn recent_user_messages(
        &self,
        user_id: &str,
        chatroom_id: Uuid,
    ) -> Result<Vec<ChatMessage>, crate::backend::store::StoreError> {
        let window = self.threshold.saturating_mul(SNAPSHOT_WINDOW_FACTOR);
        let newest_first = self.store.page_messages(chatroom_id, 0, window).await?;
        let mut messages: Vec<ChatMessage> = newest_first
            .into_iter()
            .filter(|m| m.sender_id == user_id && self.counts(m))
            .take(self.threshold as usize)
            .collect();
        messages.reverse();
        Ok(messages)
    }
}

/// Run analysis tasks until every trigger is dropped
pub fn spawn_analysis_worker(
    mut tasks: mpsc::Receiver<AnalysisTask>,
    analyzer: Arc<dyn MoodAnalyzer>,
    history: MoodHistoryStore,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = tasks.recv().await {
            let text = task.combined_text();
            info!(
                "[Analysis] Analyzing {} messages of {} ({} chars)",
                task.messages.len(),
                task.user_id,
                text.len()
            );
            match analyzer.analyze(&text).await {
                Ok(Some(result)) => {
                    info!(
                        "[Analysis] {} mood={} intensity={}",
                        task.user_id, result.mood_type, result.intensity
                    );
                    history.record(MoodRecord {
                        user_id: task.user_id,
                        mood_type: result.mood_type,
                        intensity: result.intensity,
                        source_text: text,
                        analyzed_at: Utc::now(),
                    });
                }
                Ok(None) => warn!("[Analysis] Empty analysis result for {}", task.user_id),
                Err(e) => error!("[Analysis] Analysis of {} failed: {}", task.user_id, e),
            }
        }
        debug!("[Analysis] Worker stopped");
    })
}
