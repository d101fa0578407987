//! # LLM client abstraction
//!
//! Defines the [`Provider`] trait, one adapter per backend (OpenAI-compatible, Anthropic,
//! Gemini, Ollama) and the [`ProviderRouter`] that tries a preferred provider first and
//! falls back to the others in configuration order. Transport-agnostic; used by faq-bot.
//!
//! Providers never retry: one call is one outbound request. Retry across backends is the
//! router's job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod anthropic;
pub mod config;
mod error;
mod gemini;
mod http;
mod ollama;
mod openai;
mod registry;
mod router;

pub use anthropic::AnthropicProvider;
pub use config::{LlmConfig, ProviderConfig, ProviderKind};
pub use error::{ProviderError, RouterError};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{build_provider, build_router};
pub use router::{
    spawn_catalog_refresher, ProviderRouter, RoutedReply, DEFAULT_PROVIDER_PRIORITY,
};

/// Role of a message, one-to-one with the chat `role` values most backends accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat message. Immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }
}

/// Reply from one provider call: text plus token usage (reported or estimated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One model offered by a provider, as shown in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderModel {
    pub id: String,
    pub display_name: String,
    pub provider: String,
    pub description: String,
}

/// Uniform backend capability. One implementation per backend; see [`build_provider`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name used as the router key and as `used_provider` (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Model used when the router calls this provider.
    fn default_model(&self) -> &str;

    /// Upper bound for one call; the router treats expiry as a provider failure.
    fn timeout(&self) -> Duration;

    /// Sends `messages` to `model` and returns the reply with token counts.
    async fn chat(&self, messages: &[ChatMessage], model: &str)
        -> Result<ChatReply, ProviderError>;

    /// Lists the models this backend currently offers.
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError>;
}

/// Characters per token used when a backend does not report usage.
pub const CHARS_PER_TOKEN: u64 = 4;

/// Deterministic token estimate: `ceil(chars / CHARS_PER_TOKEN)`.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Estimated input tokens for a request: the sum over every message's content.
pub fn estimate_input_tokens(messages: &[ChatMessage]) -> u64 {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

/// Checks the provider contract: at least one non-system message and a non-empty model id.
pub fn validate_request(messages: &[ChatMessage], model: &str) -> Result<(), ProviderError> {
    if model.trim().is_empty() {
        return Err(ProviderError::InvalidRequest("model id is empty".to_string()));
    }
    if !messages.iter().any(|m| !m.is_system()) {
        return Err(ProviderError::InvalidRequest(
            "messages contain no user or assistant entry".to_string(),
        ));
    }
    Ok(())
}

/// Replaces system message content with a per-provider override. When the request has no
/// system message, the override is prepended.
pub fn with_system_override(messages: &[ChatMessage], system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let Some(prompt) = system_prompt else {
        return messages.to_vec();
    };
    let mut out: Vec<ChatMessage> = messages
        .iter()
        .map(|m| {
            if m.is_system() {
                ChatMessage {
                    content: prompt.to_string(),
                    ..m.clone()
                }
            } else {
                m.clone()
            }
        })
        .collect();
    if !out.iter().any(ChatMessage::is_system) {
        out.insert(0, ChatMessage::system(prompt));
    }
    out
}

/// Splits a request for backends that take the system prompt separately: joins system
/// contents and returns the dialogue with leading assistant turns dropped (Anthropic and
/// Gemini require the first turn to come from the user).
pub(crate) fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.is_system())
        .map(|m| m.content.as_str())
        .collect();
    let dialogue: Vec<&ChatMessage> = messages
        .iter()
        .filter(|m| !m.is_system())
        .skip_while(|m| m.role == MessageRole::Assistant)
        .collect();
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, dialogue)
}

/// Masks an API key for safe logging: first 7 chars + `***` + last 4 chars.
/// Keys of length ≤ 11 are fully masked.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // counted in characters, not bytes
        assert_eq!(estimate_tokens("你好世界"), 1);
    }

    #[test]
    fn test_estimate_input_tokens_sums_messages() {
        let messages = vec![ChatMessage::system("12345678"), ChatMessage::user("1")];
        assert_eq!(estimate_input_tokens(&messages), 3);
    }

    #[test]
    fn test_validate_request() {
        let only_system = vec![ChatMessage::system("be nice")];
        assert!(validate_request(&only_system, "m").is_err());
        let ok = vec![ChatMessage::system("be nice"), ChatMessage::user("hi")];
        assert!(validate_request(&ok, "m").is_ok());
        assert!(validate_request(&ok, "  ").is_err());
    }

    #[test]
    fn test_system_override_replaces_and_prepends() {
        let with_system = vec![ChatMessage::system("global"), ChatMessage::user("hi")];
        let out = with_system_override(&with_system, Some("local"));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content, "local");

        let without = vec![ChatMessage::user("hi")];
        let out = with_system_override(&without, Some("local"));
        assert_eq!(out.len(), 2);
        assert!(out[0].is_system());

        let untouched = with_system_override(&with_system, None);
        assert_eq!(untouched[0].content, "global");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("sk-12345"), "***");
        assert_eq!(mask_token("sk-proj-abcdefghijklmnop"), "sk-proj***mnop");
    }
}
