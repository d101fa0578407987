//! Config tests.

use crate::config::BotConfig;
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "TELEGRAM_API_URL",
    "TELOXIDE_API_URL",
    "LOG_FILE",
    "ADMIN_IDS",
    "FAQ_SEED_FILE",
    "AI_THINKING_MESSAGE",
    "AI_MODEL_REFRESH_SECS",
    "AI_HISTORY_LENGTH",
    "STREAM_MIN_CHARS",
    "STREAM_MIN_INTERVAL_MS",
    "STREAM_CHUNK_CHARS",
    "CHAT_MIN_SPACING_MS",
    "WIZARD_TIMEOUT_SECS",
    "WIZARD_SWEEP_INTERVAL_SECS",
    "OPENAI_API_KEY",
    "OPENAI_ENABLED",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_ENABLED",
    "GEMINI_API_KEY",
    "GEMINI_ENABLED",
    "OLLAMA_API_URL",
    "OLLAMA_ENABLED",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.bot_token(), "test_token");
    assert!(config.telegram_api_url().is_none());
    assert_eq!(config.log_file(), "logs/faq-bot.log");
    assert!(config.base.admin_ids.is_empty());
    assert!(config.base.faq_seed_file.is_none());
    assert_eq!(config.ai.thinking_message, "Thinking...");
    assert_eq!(config.ai.model_refresh_secs, 3600);
    assert_eq!(config.stream.min_chars, 50);
    assert_eq!(config.stream.min_interval_ms, 2000);
    assert_eq!(config.stream.chunk_chars, 20);
    assert_eq!(config.stream.chunk_delay_ms, 300);
    assert_eq!(config.stream.chat_min_spacing_ms, 1500);
    assert_eq!(config.wizard.timeout_secs, 300);
    assert_eq!(config.wizard.sweep_interval_secs, 30);
    assert_eq!(config.llm.history_length, 10);
    assert_eq!(config.llm.enabled_providers().count(), 0);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("BOT_TOKEN", "custom_token");
    env::set_var("ADMIN_IDS", "11, 22 ,33");
    env::set_var("STREAM_MIN_CHARS", "80");
    env::set_var("WIZARD_TIMEOUT_SECS", "120");
    env::set_var("AI_THINKING_MESSAGE", "One moment...");
    env::set_var("ANTHROPIC_API_KEY", "sk-ant-abcdefghijk");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.base.admin_ids, vec![11, 22, 33]);
    assert!(config.is_admin(22));
    assert!(!config.is_admin(44));
    assert_eq!(config.stream.min_chars, 80);
    assert_eq!(config.wizard.timeout_secs, 120);
    assert_eq!(config.ai.thinking_message, "One moment...");
    let enabled: Vec<&str> = config.llm.enabled_providers().map(|p| p.name()).collect();
    assert_eq!(enabled, vec!["anthropic"]);

    clear_env();
}

#[test]
#[serial]
fn test_load_config_with_override_token() {
    clear_env();
    env::set_var("BOT_TOKEN", "env_token");

    let config = BotConfig::load(Some("override_token".to_string())).unwrap();
    assert_eq!(config.bot_token(), "override_token");

    clear_env();
}

#[test]
#[serial]
fn test_missing_token_is_error() {
    clear_env();
    assert!(BotConfig::load(None).is_err());
}

#[test]
#[serial]
fn test_invalid_admin_ids_is_error() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("ADMIN_IDS", "12,abc");
    assert!(BotConfig::load(None).is_err());
    clear_env();
}

#[test]
#[serial]
fn test_validate_telegram_api_url_invalid() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");
    env::set_var("TELEGRAM_API_URL", "not-a-valid-url");

    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_validate_enabled_provider_without_key() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");
    env::set_var("GEMINI_ENABLED", "true");

    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
}
