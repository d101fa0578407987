//! Provider router: preferred provider first, then the others in registration order,
//! first success wins. Also owns the per-provider model catalog.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{ChatMessage, ChatReply, Provider, ProviderError, ProviderModel, RouterError};

/// Order in which [`ProviderRouter::default_provider`] looks for an enabled provider.
pub const DEFAULT_PROVIDER_PRIORITY: [&str; 4] = ["openai", "anthropic", "gemini", "ollama"];

/// Successful routed call: the reply plus the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub used_provider: String,
}

impl RoutedReply {
    fn from_reply(reply: ChatReply, used_provider: &str) -> Self {
        Self {
            content: reply.content,
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            used_provider: used_provider.to_string(),
        }
    }
}

struct ProviderSlot {
    provider: Arc<dyn Provider>,
    disabled_models: Vec<String>,
}

impl ProviderSlot {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn is_disabled(&self, model: &str) -> bool {
        self.disabled_models.iter().any(|d| d == model)
    }
}

type Catalog = HashMap<String, Arc<Vec<ProviderModel>>>;

/// Holds the enabled providers (in configuration order) and their model catalog.
pub struct ProviderRouter {
    slots: Vec<ProviderSlot>,
    catalog: RwLock<Catalog>,
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRouter {
    /// Creates a router with no providers.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            catalog: RwLock::new(HashMap::new()),
        }
    }

    /// Appends an enabled provider. Registration order is the fallback order.
    pub fn with_provider(self, provider: Arc<dyn Provider>) -> Self {
        self.with_provider_disabled_models(provider, Vec::new())
    }

    /// Appends an enabled provider whose `disabled_models` are never called or listed.
    pub fn with_provider_disabled_models(
        mut self,
        provider: Arc<dyn Provider>,
        disabled_models: Vec<String>,
    ) -> Self {
        self.slots.push(ProviderSlot {
            provider,
            disabled_models,
        });
        self
    }

    /// Enabled provider names in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.slots.iter().map(ProviderSlot::name).collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    fn slot(&self, name: &str) -> Option<&ProviderSlot> {
        self.slots.iter().find(|s| s.name() == name)
    }

    /// First enabled provider in [`DEFAULT_PROVIDER_PRIORITY`], else the first enabled one,
    /// else an empty string meaning no backend is available.
    pub fn default_provider(&self) -> String {
        DEFAULT_PROVIDER_PRIORITY
            .iter()
            .find(|name| self.is_enabled(name))
            .map(|name| name.to_string())
            .or_else(|| self.slots.first().map(|s| s.name().to_string()))
            .unwrap_or_default()
    }

    /// Tries `preferred` first (if enabled), then every other provider in order. Returns the
    /// first success. Individual failures are logged and aggregated, never returned alone.
    #[instrument(skip(self, messages, cancel), fields(message_count = messages.len()))]
    pub async fn select_and_chat(
        &self,
        messages: &[ChatMessage],
        preferred: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<RoutedReply, RouterError> {
        if self.slots.is_empty() {
            return Err(RouterError::NoProvidersEnabled);
        }

        let preferred = preferred
            .filter(|p| !p.is_empty())
            .and_then(|p| self.slot(p));
        let order = preferred.into_iter().chain(
            self.slots
                .iter()
                .filter(|s| preferred.map_or(true, |p| p.name() != s.name())),
        );

        let mut failures = Vec::new();
        for slot in order {
            if cancel.is_cancelled() {
                return Err(RouterError::Cancelled);
            }
            let name = slot.name();
            info!(provider = %name, "step: calling provider");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RouterError::Cancelled),
                r = self.call_provider(slot, messages) => r,
            };

            match result {
                Ok(reply) => {
                    info!(
                        provider = %name,
                        input_tokens = reply.input_tokens,
                        output_tokens = reply.output_tokens,
                        "step: provider answered"
                    );
                    return Ok(RoutedReply::from_reply(reply, name));
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "Provider failed, trying next");
                    failures.push((name.to_string(), e.to_string()));
                }
            }
        }

        Err(RouterError::AllProvidersFailed { failures })
    }

    async fn call_provider(
        &self,
        slot: &ProviderSlot,
        messages: &[ChatMessage],
    ) -> Result<ChatReply, ProviderError> {
        let model = self.resolve_model(slot).await?;
        let timeout = slot.provider.timeout();
        debug!(provider = %slot.name(), model = %model, timeout_secs = timeout.as_secs(), "Resolved model");
        match tokio::time::timeout(timeout, slot.provider.chat(messages, &model)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout.as_secs())),
        }
    }

    /// Configured default model unless disabled; otherwise the first usable catalog model.
    async fn resolve_model(&self, slot: &ProviderSlot) -> Result<String, ProviderError> {
        let configured = slot.provider.default_model();
        if !configured.is_empty() && !slot.is_disabled(configured) {
            return Ok(configured.to_string());
        }
        self.catalog
            .read()
            .await
            .get(slot.name())
            .and_then(|models| models.first().map(|m| m.id.clone()))
            .ok_or_else(|| {
                ProviderError::InvalidRequest(format!("no usable model for {}", slot.name()))
            })
    }

    /// Fetches every provider's model list concurrently and replaces each successful
    /// provider's catalog entry. A failed provider keeps its previous list. Returns the
    /// number of providers refreshed.
    #[instrument(skip(self))]
    pub async fn refresh_model_catalog(&self) -> usize {
        let fetches = self.slots.iter().map(|slot| async move {
            let timeout = slot.provider.timeout();
            let result = match tokio::time::timeout(timeout, slot.provider.list_models()).await {
                Ok(r) => r,
                Err(_) => Err(ProviderError::Timeout(timeout.as_secs())),
            };
            (slot, result)
        });
        let results = join_all(fetches).await;

        let mut refreshed = 0;
        let mut catalog = self.catalog.write().await;
        for (slot, result) in results {
            match result {
                Ok(models) => {
                    let models: Vec<ProviderModel> = models
                        .into_iter()
                        .filter(|m| !slot.is_disabled(&m.id))
                        .collect();
                    info!(provider = %slot.name(), model_count = models.len(), "Model catalog refreshed");
                    catalog.insert(slot.name().to_string(), Arc::new(models));
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(provider = %slot.name(), error = %e, "Model catalog refresh failed; keeping previous list");
                }
            }
        }
        refreshed
    }

    /// Cached models for one provider, if it has been refreshed at least once.
    pub async fn models(&self, provider: &str) -> Option<Arc<Vec<ProviderModel>>> {
        self.catalog.read().await.get(provider).cloned()
    }

    /// Cached catalog in provider order; providers never refreshed are omitted.
    pub async fn catalog(&self) -> Vec<(String, Arc<Vec<ProviderModel>>)> {
        let catalog = self.catalog.read().await;
        self.slots
            .iter()
            .filter_map(|s| {
                catalog
                    .get(s.name())
                    .map(|models| (s.name().to_string(), models.clone()))
            })
            .collect()
    }
}

/// Refreshes the catalog immediately and then every `interval` until `cancel` fires.
pub fn spawn_catalog_refresher(
    router: Arc<ProviderRouter>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Catalog refresher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    router.refresh_model_catalog().await;
                }
            }
        }
    })
}
