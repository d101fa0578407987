//! Runtime tuning for the AI reply path, streaming delivery and admin wizards.

use llm_client::config::env_parse;
use std::env;
use std::time::Duration;

/// AI_THINKING_MESSAGE, AI_MODEL_REFRESH_SECS.
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// Placeholder sent before the provider answers.
    pub thinking_message: String,
    pub model_refresh_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            thinking_message: "Thinking...".to_string(),
            model_refresh_secs: 3600,
        }
    }
}

impl AiSettings {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            thinking_message: env::var("AI_THINKING_MESSAGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.thinking_message),
            model_refresh_secs: env_parse("AI_MODEL_REFRESH_SECS", d.model_refresh_secs),
        }
    }

    pub fn model_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.model_refresh_secs.max(1))
    }
}

/// STREAM_* and CHAT_MIN_SPACING_MS.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub min_chars: usize,
    pub min_interval_ms: u64,
    /// Characters revealed per progressive step.
    pub chunk_chars: usize,
    pub chunk_delay_ms: u64,
    pub chat_min_spacing_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            min_chars: 50,
            min_interval_ms: 2000,
            chunk_chars: 20,
            chunk_delay_ms: 300,
            chat_min_spacing_ms: 1500,
        }
    }
}

impl StreamSettings {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_chars: env_parse("STREAM_MIN_CHARS", d.min_chars),
            min_interval_ms: env_parse("STREAM_MIN_INTERVAL_MS", d.min_interval_ms),
            chunk_chars: env_parse("STREAM_CHUNK_CHARS", d.chunk_chars).max(1),
            chunk_delay_ms: env_parse("STREAM_CHUNK_DELAY_MS", d.chunk_delay_ms),
            chat_min_spacing_ms: env_parse("CHAT_MIN_SPACING_MS", d.chat_min_spacing_ms),
        }
    }
}

/// WIZARD_TIMEOUT_SECS, WIZARD_SWEEP_INTERVAL_SECS.
#[derive(Debug, Clone)]
pub struct WizardSettings {
    pub timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            sweep_interval_secs: 30,
        }
    }
}

impl WizardSettings {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            timeout_secs: env_parse("WIZARD_TIMEOUT_SECS", d.timeout_secs),
            sweep_interval_secs: env_parse("WIZARD_SWEEP_INTERVAL_SECS", d.sweep_interval_secs)
                .max(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
