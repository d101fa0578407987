//! OpenAI-compatible provider built on async-openai. Works with any endpoint that speaks
//! the chat completions API (set `OPENAI_API_URL`).

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::{
    estimate_input_tokens, estimate_tokens, mask_token, validate_request, with_system_override,
    ChatMessage, ChatReply, MessageRole, Provider, ProviderError, ProviderModel,
};

/// Provider for OpenAI and OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    name: String,
    model: String,
    system_prompt: Option<String>,
    timeout: Duration,
    api_key_for_logging: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(api_url.trim_end_matches('/'));
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        // One request per call: async-openai retries 429/5xx unless its backoff is exhausted.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Ok(Self {
            client: Client::with_config(config)
                .with_http_client(http)
                .with_backoff(no_retry),
            name: "openai".to_string(),
            model,
            system_prompt: None,
            timeout,
            api_key_for_logging: api_key,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_system_prompt_opt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }
}

/// Converts a single [`ChatMessage`] into the OpenAI request message format.
fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, ProviderError> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self, messages), fields(provider = %self.name))]
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<ChatReply, ProviderError> {
        validate_request(messages, model)?;
        let messages = with_system_override(messages, self.system_prompt.as_deref());

        info!(
            model = %model,
            message_count = messages.len(),
            api_key = %mask_token(&self.api_key_for_logging),
            "OpenAI chat_completion request"
        );

        let request_messages = messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(request_messages)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .ok_or_else(|| ProviderError::Payload("response has no choices".to_string()))?
            .message
            .content
            .clone()
            .unwrap_or_default();

        let (input_tokens, output_tokens) = match response.usage {
            Some(u) => (u.prompt_tokens as u64, u.completion_tokens as u64),
            None => (estimate_input_tokens(&messages), estimate_tokens(&content)),
        };
        debug!(input_tokens, output_tokens, "OpenAI chat_completion usage");

        Ok(ChatReply {
            content,
            input_tokens,
            output_tokens,
        })
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError> {
        let response = self.client.models().list().await?;
        Ok(response
            .data
            .into_iter()
            .map(|m| ProviderModel {
                display_name: m.id.clone(),
                id: m.id,
                provider: self.name.clone(),
                description: format!("owned by {}", m.owned_by),
            })
            .collect())
    }
}
