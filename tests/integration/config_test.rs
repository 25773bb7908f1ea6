//! Configuration loading from a TOML file and the environment

use serial_test::serial;
use std::io::Write;
use std::time::Duration;

use teamchat::backend::server::config::{load_chat_config, CONFIG_PATH_VAR};
use teamchat::shared::{ChatConfig, ConfigError};

use crate::{assert_err, assert_ok};

const OVERRIDES: [&str; 3] = [
    "TEAMCHAT_PRESENCE_SETTLE_MS",
    "TEAMCHAT_RECENT_CAPACITY",
    "TEAMCHAT_ANALYSIS_TRIGGER",
];

fn clear_env() {
    std::env::remove_var(CONFIG_PATH_VAR);
    for key in OVERRIDES {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_file_or_overrides() {
    clear_env();
    let config = assert_ok!(load_chat_config());
    assert_eq!(config, ChatConfig::default());
}

#[test]
#[serial]
fn test_file_then_env_overrides() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "presence_settle_ms = 250\nrecent_message_capacity = 40\nai_sender_name = \"Helper\""
    )
    .unwrap();

    std::env::set_var(CONFIG_PATH_VAR, file.path());
    std::env::set_var("TEAMCHAT_RECENT_CAPACITY", "12");
    let config = load_chat_config();
    clear_env();

    let config = assert_ok!(config);
    assert_eq!(config.presence_settle_delay, Duration::from_millis(250));
    assert_eq!(config.recent_message_capacity, 12);
    assert_eq!(config.ai_sender_name, "Helper");
    assert_eq!(config.analysis_trigger_count, 5);
}

#[test]
#[serial]
fn test_missing_and_invalid_files_are_errors() {
    clear_env();
    std::env::set_var(CONFIG_PATH_VAR, "/definitely/not/here.toml");
    let missing = load_chat_config();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "unknown_knob = 1").unwrap();
    std::env::set_var(CONFIG_PATH_VAR, file.path());
    let unknown = load_chat_config();
    clear_env();

    assert_err!(missing, ConfigError::Io { .. });
    assert_err!(unknown, ConfigError::Parse(_));
}
