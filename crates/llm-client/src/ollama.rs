//! Ollama provider (`POST /api/chat` with `stream: false`, `GET /api/tags`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::http::{client, send_json};
use crate::{
    estimate_input_tokens, estimate_tokens, validate_request, with_system_override, ChatMessage,
    ChatReply, Provider, ProviderError, ProviderModel,
};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagInfo>,
}

#[derive(Deserialize)]
struct TagInfo {
    name: String,
    #[serde(default)]
    details: Option<TagDetails>,
}

#[derive(Deserialize)]
struct TagDetails {
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    parameter_size: Option<String>,
}

/// Provider for a local or remote Ollama server.
pub struct OllamaProvider {
    client: reqwest::Client,
    api_url: String,
    model: String,
    system_prompt: Option<String>,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(api_url: String, model: String, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: client(timeout)?,
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
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
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

        let body = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
        };

        info!(model = %model, message_count = body.messages.len(), "Ollama chat request");

        let response: ChatResponse =
            send_json(self.client.post(format!("{}/api/chat", self.api_url)).json(&body)).await?;

        let content = response
            .message
            .ok_or_else(|| ProviderError::Payload("response has no message".to_string()))?
            .content;

        // Ollama omits the counts when the prompt was served from cache.
        let input_tokens = response
            .prompt_eval_count
            .unwrap_or_else(|| estimate_input_tokens(&messages));
        let output_tokens = response
            .eval_count
            .unwrap_or_else(|| estimate_tokens(&content));
        debug!(input_tokens, output_tokens, "Ollama usage");

        Ok(ChatReply {
            content,
            input_tokens,
            output_tokens,
        })
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError> {
        let response: TagsResponse =
            send_json(self.client.get(format!("{}/api/tags", self.api_url))).await?;
        Ok(response
            .models
            .into_iter()
            .map(|m| {
                let description = m
                    .details
                    .map(|d| {
                        [d.family, d.parameter_size]
                            .into_iter()
                            .flatten()
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .unwrap_or_default();
                ProviderModel {
                    id: m.name.clone(),
                    display_name: m.name,
                    provider: "ollama".to_string(),
                    description,
                }
            })
            .collect())
    }
}
