//! Analysis Module
//!
//! Side effects that run off the message hot path.
//!
//! - **`trigger`** - per-(user, room) message counting and task hand-off
//! - **`analyzer`** - mood analysis client and per-user mood history
//! - **`ai`** - AI assistant sessions and replies
//!
//! [`enrich_with_mood`] decorates team member listings with the latest
//! recorded mood. It never fails: without a mood the member comes back as is.

pub mod ai;
pub mod analyzer;
pub mod trigger;

pub use ai::{AiChatService, AiResponder, DisabledAiResponder, HttpAiResponder, AI_GREETING};
pub use analyzer::{
    AnalysisError, DisabledMoodAnalyzer, HttpMoodAnalyzer, MoodAnalyzer, MoodHistoryStore, MoodRecord, MoodResult,
};
pub use trigger::{spawn_analysis_worker, AnalysisTask, AnalysisTrigger, TriggerOutcome, ANALYSIS_QUEUE_CAPACITY};

use serde::{Deserialize, Serialize};

use crate::backend::auth::TeamMember;

/// Where the latest mood of a user comes from
pub trait MoodSource: Send + Sync {
    fn latest_mood(&self, user_id: &str) -> Result<Option<MoodRecord>, AnalysisError>;
}

impl MoodSource for MoodHistoryStore {
    fn latest_mood(&self, user_id: &str) -> Result<Option<MoodRecord>, AnalysisError> {
        Ok(self.latest(user_id))
    }
}

/// A team member with the latest recorded mood, if any
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithMood {
    #[serde(flatten)]
    pub member: TeamMember,
    pub latest_mood_type: Option<String>,
    pub latest_mood_intensity: Option<u8>,
}

pub fn enrich_with_mood(member: TeamMember, moods: &dyn MoodSource) -> MemberWithMood {
    let latest = match moods.latest_mood(&member.user_id) {
        Ok(latest) => latest,
        Err(e) => {
            tracing::error!("[Analysis] Mood lookup failed for {}: {}", member.user_id, e);
            None
        }
    };
    MemberWithMood {
        latest_mood_type: latest.as_ref().map(|m| m.mood_type.clone()),
        latest_mood_intensity: latest.as_ref().map(|m| m.intensity),
        member,
    }
}
