//! Scripted [`llm_client::Provider`] for handler tests.

use async_trait::async_trait;
use llm_client::{ChatMessage, ChatReply, Provider, ProviderError, ProviderModel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakeProvider {
    name: String,
    reply: Option<ChatReply>,
    delay: Duration,
    calls: AtomicUsize,
    /// Message lists received, one per call.
    pub received: Mutex<Vec<Vec<ChatMessage>>>,
    models: Vec<String>,
}

impl FakeProvider {
    pub fn ok(name: &str, content: &str, input: u64, output: u64) -> Arc<Self> {
        Arc::new(Self::build(
            name,
            Some(ChatReply {
                content: content.to_string(),
                input_tokens: input,
                output_tokens: output,
            }),
            Duration::ZERO,
        ))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, None, Duration::ZERO))
    }

    /// Answers `content` after `delay`.
    pub fn slow(name: &str, content: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(
            name,
            Some(ChatReply {
                content: content.to_string(),
                input_tokens: 1,
                output_tokens: 1,
            }),
            delay,
        ))
    }

    pub fn with_models(name: &str, models: &[&str]) -> Arc<Self> {
        let mut p = Self::build(name, None, Duration::ZERO);
        p.models = models.iter().map(|m| m.to_string()).collect();
        Arc::new(p)
    }

    fn build(name: &str, reply: Option<ChatReply>, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            reply,
            delay,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            models: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn chat(&self, messages: &[ChatMessage], _model: &str) -> Result<ChatReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(messages.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().ok_or(ProviderError::Status {
            status: 503,
            body: format!("{} unavailable", self.name),
        })
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, ProviderError> {
        Ok(self
            .models
            .iter()
            .map(|id| ProviderModel {
                id: id.clone(),
                display_name: id.clone(),
                provider: self.name.clone(),
                description: String::new(),
            })
            .collect())
    }
}
