//! Anthropic Messages API provider (`POST /v1/messages`, content blocks).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::http::{client, send_json};
use crate::{
    estimate_input_tokens, estimate_tokens, mask_token, split_system, validate_request,
    with_system_override, ChatMessage, ChatReply, Provider, ProviderError, ProviderModel,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Provider for Anthropic's Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    system_prompt: Option<String>,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client(timeout)?,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            system_prompt: None,
            timeout,
        })
    }

    pub fn with_system_prompt_opt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self, messages))]
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<ChatReply, ProviderError> {
        validate_request(messages, model)?;
        let messages = with_system_override(messages, self.system_prompt.as_deref());
        let (system, dialogue) = split_system(&messages);
        if dialogue.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "no user message after leading assistant turns".to_string(),
            ));
        }

        let body = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages: dialogue
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        info!(
            model = %model,
            message_count = body.messages.len(),
            api_key = %mask_token(&self.api_key),
            "Anthropic messages request"
        );

        let response: MessagesResponse =
            send_json(self.request(reqwest::Method::POST, "/v1/messages").json(&body)).await?;

        let content = response
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let (input_tokens, output_tokens) = match response.usage {
            Some(u) => (u.input_tokens, u.output_tokens),
            None => (estimate_input_tokens(&messages), estimate_tokens(&content)),
        };
        debug!(input_tokens, output_tokens, "Anthropic usage");

        Ok(ChatReply {
            content,
            input_tokens,
            output_tokens,
        })
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError> {
        let response: ModelsResponse =
            send_json(self.request(reqwest::Method::GET, "/v1/models")).await?;
        Ok(response
            .data
            .into_iter()
            .map(|m| ProviderModel {
                display_name: m.display_name.unwrap_or_else(|| m.id.clone()),
                description: m
                    .created_at
                    .map(|c| format!("released {}", c))
                    .unwrap_or_default(),
                id: m.id,
                provider: "anthropic".to_string(),
            })
            .collect())
    }
}
