//! LLM configuration: per-provider options plus global AI settings, loaded from env.
//!
//! Per-provider variables use the provider prefix (`OPENAI_`, `ANTHROPIC_`, `GEMINI_`,
//! `OLLAMA_`). Missing per-provider overrides fall back to the global values.

use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Backends this crate has an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// All kinds in the fixed priority order used by `default_provider`.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI",
            ProviderKind::Anthropic => "ANTHROPIC",
            ProviderKind::Gemini => "GEMINI",
            ProviderKind::Ollama => "OLLAMA",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Ollama => "llama3",
        }
    }

    /// Ollama runs locally and needs no key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

/// Options for one backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub enabled: bool,
    pub api_key: String,
    pub api_url: String,
    pub default_model: String,
    pub disabled_models: Vec<String>,
    /// Overrides [`LlmConfig::system_prompt`] for this provider.
    pub system_prompt: Option<String>,
    /// Overrides [`LlmConfig::timeout_seconds`] for this provider.
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Disabled provider of the given kind with default URL and model.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            enabled: false,
            api_key: String::new(),
            api_url: kind.default_api_url().to_string(),
            default_model: kind.default_model().to_string(),
            disabled_models: Vec::new(),
            system_prompt: None,
            timeout_secs: None,
        }
    }

    /// Loads `<PREFIX>_*` variables. When `<PREFIX>_ENABLED` is unset the provider is enabled
    /// if its key (Ollama: its URL) is present.
    pub fn from_env(kind: ProviderKind) -> Self {
        let prefix = kind.env_prefix();
        let var = |name: &str| {
            env::var(format!("{}_{}", prefix, name))
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let api_key = var("API_KEY").unwrap_or_default();
        let api_url_set = var("API_URL");
        let enabled = match var("ENABLED").and_then(|s| s.parse::<bool>().ok()) {
            Some(explicit) => explicit,
            None if kind.requires_api_key() => !api_key.is_empty(),
            None => api_url_set.is_some(),
        };

        Self {
            kind,
            enabled,
            api_key,
            api_url: api_url_set.unwrap_or_else(|| kind.default_api_url().to_string()),
            default_model: var("DEFAULT_MODEL").unwrap_or_else(|| kind.default_model().to_string()),
            disabled_models: var("DISABLED_MODELS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            system_prompt: var("SYSTEM_PROMPT"),
            timeout_secs: var("TIMEOUT_SECS").and_then(|s| s.parse().ok()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Global AI settings plus one [`ProviderConfig`] per backend (in priority order).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub providers: Vec<ProviderConfig>,
    pub system_prompt: Option<String>,
    /// Max rounds kept in a conversation.
    pub history_length: usize,
    pub history_timeout_minutes: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::ALL.iter().map(|k| ProviderConfig::new(*k)).collect(),
            system_prompt: None,
            history_length: 10,
            history_timeout_minutes: 30,
            timeout_seconds: 60,
        }
    }
}

impl LlmConfig {
    /// Loads from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let system_prompt = env::var("AI_SYSTEM_PROMPT")
            .or_else(|_| env::var("SYSTEM_PROMPT"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            providers: ProviderKind::ALL.iter().map(|k| ProviderConfig::from_env(*k)).collect(),
            system_prompt,
            history_length: env_parse("AI_HISTORY_LENGTH", defaults.history_length),
            history_timeout_minutes: env_parse(
                "AI_HISTORY_TIMEOUT_MINUTES",
                defaults.history_timeout_minutes,
            ),
            timeout_seconds: env_parse("AI_TIMEOUT_SECONDS", defaults.timeout_seconds),
        })
    }

    /// Fails when an enabled provider that needs a key has none.
    pub fn validate(&self) -> Result<()> {
        for p in self.enabled_providers() {
            if p.kind.requires_api_key() && p.api_key.is_empty() {
                anyhow::bail!("{} is enabled but {}_API_KEY is not set", p.name(), p.kind.env_prefix());
            }
        }
        if self.history_length == 0 {
            anyhow::bail!("AI_HISTORY_LENGTH must be at least 1");
        }
        Ok(())
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    /// Per-provider system prompt, else the global one.
    pub fn effective_system_prompt<'a>(&'a self, provider: &'a ProviderConfig) -> Option<&'a str> {
        provider
            .system_prompt
            .as_deref()
            .or(self.system_prompt.as_deref())
    }

    /// Per-provider timeout, else the global one.
    pub fn effective_timeout(&self, provider: &ProviderConfig) -> Duration {
        Duration::from_secs(provider.timeout_secs.unwrap_or(self.timeout_seconds))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.history_timeout_minutes * 60)
    }
}

/// Parses env var `name`, falling back to `default` when unset or unparsable.
pub fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
