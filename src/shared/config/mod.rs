//! Chat core configuration
//!
//! Tunables of the chat core. Defaults match production behaviour; a TOML
//! file and environment overrides are layered on top by the server's config
//! loader.
//!
//! ```rust
//! use std::time::Duration;
//! use teamchat::shared::config::ChatConfig;
//!
//! let config = ChatConfig::builder()
//!     .presence_settle_delay(Duration::from_millis(50))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.recent_message_capacity, 100);
//! ```

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Runtime configuration of the chat core
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// How long a last-session disconnect waits before the user is reconciled offline
    pub presence_settle_delay: Duration,
    /// Entries kept per room in the recent-message cache
    pub recent_message_capacity: usize,
    /// Messages per (user, room) between two mood analyses
    pub analysis_trigger_count: u64,
    /// Expiry of the per-(user, room) message counter
    pub message_counter_ttl: Duration,
    /// Buffer size of each topic's broadcast channel
    pub broadcast_capacity: usize,
    /// Identity used for assistant and system messages
    pub ai_sender_id: String,
    pub ai_sender_name: String,
    /// Display name used when the user directory cannot resolve a sender
    pub unknown_sender_name: String,
    /// Window searched when resolving a user's last read time
    pub read_lookback: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            presence_settle_delay: Duration::from_millis(500),
            recent_message_capacity: 100,
            analysis_trigger_count: 5,
            message_counter_ttl: Duration::from_secs(24 * 60 * 60),
            broadcast_capacity: 1000,
            ai_sender_id: "ai-assistant".to_string(),
            ai_sender_name: "AI Assistant".to_string(),
            unknown_sender_name: "Unknown user".to_string(),
            read_lookback: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl ChatConfig {
    /// Create a new ChatConfigBuilder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_message_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recent_message_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.analysis_trigger_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis_trigger_count",
                message: "must be at least 1".to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.message_counter_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "message_counter_ttl",
                message: "must be at least one second".to_string(),
            });
        }
        if self.ai_sender_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("ai_sender_id"));
        }
        Ok(())
    }

    /// Whether `user_id` is the assistant/system identity
    pub fn is_ai_sender(&self, user_id: &str) -> bool {
        user_id == self.ai_sender_id
    }

    /// Parse a TOML document and apply it over the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ChatConfigFile =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let config = file.apply(ChatConfig::default());
        config.validate()?;
        Ok(config)
    }
}

/// On-disk representation. Every field is optional; durations are in
/// milliseconds or seconds as named.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfigFile {
    pub presence_settle_ms: Option<u64>,
    pub recent_message_capacity: Option<usize>,
    pub analysis_trigger_count: Option<u64>,
    pub message_counter_ttl_secs: Option<u64>,
    pub broadcast_capacity: Option<usize>,
    pub ai_sender_id: Option<String>,
    pub ai_sender_name: Option<String>,
    pub unknown_sender_name: Option<String>,
    pub read_lookback_days: Option<u64>,
}

impl ChatConfigFile {
    /// Overlay the values present in the file onto `base`
    pub fn apply(self, mut base: ChatConfig) -> ChatConfig {
        if let Some(ms) = self.presence_settle_ms {
            base.presence_settle_delay = Duration::from_millis(ms);
        }
        if let Some(capacity) = self.recent_message_capacity {
            base.recent_message_capacity = capacity;
        }
        if let Some(count) = self.analysis_trigger_count {
            base.analysis_trigger_count = count;
        }
        if let Some(secs) = self.message_counter_ttl_secs {
            base.message_counter_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = self.broadcast_capacity {
            base.broadcast_capacity = capacity;
        }
        if let Some(id) = self.ai_sender_id {
            base.ai_sender_id = id;
        }
        if let Some(name) = self.ai_sender_name {
            base.ai_sender_name = name;
        }
        if let Some(name) = self.unknown_sender_name {
            base.unknown_sender_name = name;
        }
        if let Some(days) = self.read_lookback_days {
            base.read_lookback = Duration::from_secs(days * 24 * 60 * 60);
        }
        base
    }
}

/// Builder for ChatConfig
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: Option<ChatConfig>,
}

impl ChatConfigBuilder {
    fn config(&mut self) -> &mut ChatConfig {
        self.config.get_or_insert_with(ChatConfig::default)
    }

    pub fn presence_settle_delay(mut self, delay: Duration) -> Self {
        self.config().presence_settle_delay = delay;
        self
    }

    pub fn recent_message_capacity(mut self, capacity: usize) -> Self {
        self.config().recent_message_capacity = capacity;
        self
    }

    pub fn analysis_trigger_count(mut self, count: u64) -> Self {
        self.config().analysis_trigger_count = count;
        self
    }

    pub fn message_counter_ttl(mut self, ttl: Duration) -> Self {
        self.config().message_counter_ttl = ttl;
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config().broadcast_capacity = capacity;
        self
    }

    pub fn ai_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let config = self.config();
        config.ai_sender_id = id.into();
        config.ai_sender_name = name.into();
        self
    }

    pub fn unknown_sender_name(mut self, name: impl Into<String>) -> Self {
        self.config().unknown_sender_name = name.into();
        self
    }

    pub fn read_lookback(mut self, lookback: Duration) -> Self {
        self.config().read_lookback = lookback;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ChatConfig, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("could not parse configuration: {0}")]
    Parse(String),
    #[error("could not read configuration file {path}: {message}")]
    Io { path: String, message: String },
}
