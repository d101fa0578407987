//! Gemini provider (`POST /v1beta/models/{model}:generateContent`, contents/parts JSON).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::http::{client, send_json};
use crate::{
    estimate_input_tokens, estimate_tokens, mask_token, split_system, validate_request,
    with_system_override, ChatMessage, ChatReply, MessageRole, Provider, ProviderError,
    ProviderModel,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<OwnedPart>,
}

#[derive(Serialize, Deserialize)]
struct OwnedPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<OwnedPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Provider for Google's Gemini API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    system_prompt: Option<String>,
    timeout: Duration,
}

impl GeminiProvider {
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
}

fn gemini_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::Assistant => "model",
        _ => "user",
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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

        let body = GenerateRequest {
            contents: dialogue
                .iter()
                .map(|m| Content {
                    role: gemini_role(m.role),
                    parts: vec![Part { text: &m.content }],
                })
                .collect(),
            system_instruction: system.map(|text| SystemInstruction {
                parts: vec![OwnedPart { text: Some(text) }],
            }),
        };

        info!(
            model = %model,
            message_count = body.contents.len(),
            api_key = %mask_token(&self.api_key),
            "Gemini generateContent request"
        );

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_url, model);
        let response: GenerateResponse = send_json(
            self.client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Payload("response has no candidates".to_string()))?;
        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = response.usage_metadata;
        let input_tokens = usage
            .as_ref()
            .and_then(|u| u.prompt_token_count)
            .unwrap_or_else(|| estimate_input_tokens(&messages));
        let output_tokens = usage
            .as_ref()
            .and_then(|u| u.candidates_token_count)
            .unwrap_or_else(|| estimate_tokens(&content));
        debug!(input_tokens, output_tokens, "Gemini usage");

        Ok(ChatReply {
            content,
            input_tokens,
            output_tokens,
        })
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError> {
        let response: ModelsResponse = send_json(
            self.client
                .get(format!("{}/v1beta/models", self.api_url))
                .header("x-goog-api-key", &self.api_key),
        )
        .await?;
        Ok(response
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods.is_empty()
                    || m.supported_generation_methods.iter().any(|g| g == "generateContent")
            })
            .map(|m| {
                let id = m
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(&m.name)
                    .to_string();
                ProviderModel {
                    display_name: m.display_name.unwrap_or_else(|| id.clone()),
                    description: m.description.unwrap_or_default(),
                    id,
                    provider: "gemini".to_string(),
                }
            })
            .collect())
    }
}
