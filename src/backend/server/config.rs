/**
 * Server Configuration
 *
 * Loads the chat configuration and selects the backends the server runs on.
 *
 * # Configuration Sources
 *
 * 1. `.env` (loaded by the binary through `dotenv`)
 * 2. Optional TOML file named by `TEAMCHAT_CONFIG`
 * 3. Environment overrides: `TEAMCHAT_PRESENCE_SETTLE_MS`,
 *    `TEAMCHAT_RECENT_CAPACITY`, `TEAMCHAT_ANALYSIS_TRIGGER`
 *
 * # Backends
 *
 * - `DATABASE_URL` set: PostgreSQL store and user directory (migrations run
 *   on startup), otherwise an in-memory store and an empty directory
 * - `REDIS_URL` set: Redis cache, otherwise an in-memory cache
 * - `MOOD_ANALYZER_URL` / `AI_RESPONDER_URL`: HTTP collaborators, otherwise
 *   disabled ones
 *
 * Backend failures at startup are logged and fall back to the in-memory
 * variant so a single instance still serves.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::backend::analysis::{AiResponder, DisabledAiResponder, DisabledMoodAnalyzer, HttpAiResponder, HttpMoodAnalyzer, MoodAnalyzer};
use crate::backend::auth::{PgUserDirectory, StaticUserDirectory, UserDirectory};
use crate::backend::cache::{EphemeralCache, MemoryCache, RedisCache};
use crate::backend::store::{ChatStore, MemoryStore, PgStore};
use crate::shared::{ChatConfig, ConfigError};

pub const CONFIG_PATH_VAR: &str = "TEAMCHAT_CONFIG";

/// Load the chat configuration from the file named by `TEAMCHAT_CONFIG`
/// (if any) and apply environment overrides
pub fn load_chat_config() -> Result<ChatConfig, ConfigError> {
    let base = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => {
            tracing::info!("[Config] Loading {}", path);
            let source = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            ChatConfig::from_toml_str(&source)?
        }
        Err(_) => ChatConfig::default(),
    };
    apply_env_overrides(base, |key| std::env::var(key).ok())
}

/// Apply `TEAMCHAT_*` overrides read through `lookup`
pub fn apply_env_overrides(
    mut config: ChatConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ChatConfig, ConfigError> {
    if let Some(ms) = parse_var(&lookup, "TEAMCHAT_PRESENCE_SETTLE_MS", "presence_settle_delay")? {
        config.presence_settle_delay = Duration::from_millis(ms);
    }
    if let Some(capacity) = parse_var(&lookup, "TEAMCHAT_RECENT_CAPACITY", "recent_message_capacity")? {
        config.recent_message_capacity = capacity as usize;
    }
    if let Some(count) = parse_var(&lookup, "TEAMCHAT_ANALYSIS_TRIGGER", "analysis_trigger_count")? {
        config.analysis_trigger_count = count;
    }
    config.validate()?;
    Ok(config)
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field,
                message: format!("{}={}: {}", key, raw, e),
            }),
        None => Ok(None),
    }
}

/// Durable store and user directory
pub async fn load_store() -> (Arc<dyn ChatStore>, Arc<dyn UserDirectory>) {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("[Config] DATABASE_URL not set. Using the in-memory store; data is lost on restart.");
            return (Arc::new(MemoryStore::new()), Arc::new(StaticUserDirectory::new()));
        }
    };

    tracing::info!("[Config] Connecting to database...");
    let store = match PgStore::connect(&database_url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("[Config] Failed to connect to database: {:?}", e);
            tracing::warn!("[Config] Falling back to the in-memory store");
            return (Arc::new(MemoryStore::new()), Arc::new(StaticUserDirectory::new()));
        }
    };

    tracing::info!("[Config] Running database migrations...");
    if let Err(e) = store.migrate().await {
        tracing::error!("[Config] Failed to run database migrations: {}", e);
        tracing::warn!("[Config] Continuing without migrations - database might not be up to date");
    }

    let directory = PgUserDirectory::new(store.pool().clone());
    (Arc::new(store), Arc::new(directory))
}

/// Ephemeral cache
pub async fn load_cache() -> Arc<dyn EphemeralCache> {
    let redis_url = match std::env::var("REDIS_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("[Config] REDIS_URL not set. Using the in-memory cache; presence is per instance.");
            return Arc::new(MemoryCache::new());
        }
    };

    match RedisCache::connect(&redis_url).await {
        Ok(cache) => {
            tracing::info!("[Config] Connected to Redis");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::error!("[Config] Failed to connect to Redis: {}", e);
            tracing::warn!("[Config] Falling back to the in-memory cache");
            Arc::new(MemoryCache::new())
        }
    }
}

pub fn load_mood_analyzer() -> Arc<dyn MoodAnalyzer> {
    match std::env::var("MOOD_ANALYZER_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!("[Config] Mood analysis via {}", url);
            Arc::new(HttpMoodAnalyzer::new(url))
        }
        _ => {
            tracing::warn!("[Config] MOOD_ANALYZER_URL not set. Mood analysis disabled.");
            Arc::new(DisabledMoodAnalyzer)
        }
    }
}

pub fn load_ai_responder() -> Arc<dyn AiResponder> {
    match std::env::var("AI_RESPONDER_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!("[Config] AI replies via {}", url);
            Arc::new(HttpAiResponder::new(url))
        }
        _ => {
            tracing::warn!("[Config] AI_RESPONDER_URL not set. AI replies disabled.");
            Arc::new(DisabledAiResponder)
        }
    }
}
