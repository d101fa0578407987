//! Name-keyed construction of providers from [`LlmConfig`].

use std::sync::Arc;
use tracing::info;

use crate::config::{LlmConfig, ProviderConfig, ProviderKind};
use crate::{
    mask_token, AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider, Provider,
    ProviderError, ProviderRouter,
};

/// Builds the adapter for one provider config, applying global fallbacks for the system
/// prompt and timeout.
pub fn build_provider(
    config: &LlmConfig,
    provider: &ProviderConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let timeout = config.effective_timeout(provider);
    let system_prompt = config.effective_system_prompt(provider).map(String::from);
    let api_key = provider.api_key.clone();
    let api_url = provider.api_url.clone();
    let model = provider.default_model.clone();

    let built: Arc<dyn Provider> = match provider.kind {
        ProviderKind::OpenAi => Arc::new(
            OpenAiProvider::new(api_key, api_url, model, timeout)?
                .with_system_prompt_opt(system_prompt),
        ),
        ProviderKind::Anthropic => Arc::new(
            AnthropicProvider::new(api_key, api_url, model, timeout)?
                .with_system_prompt_opt(system_prompt),
        ),
        ProviderKind::Gemini => Arc::new(
            GeminiProvider::new(api_key, api_url, model, timeout)?
                .with_system_prompt_opt(system_prompt),
        ),
        ProviderKind::Ollama => Arc::new(
            OllamaProvider::new(api_url, model, timeout)?.with_system_prompt_opt(system_prompt),
        ),
    };
    Ok(built)
}

/// Builds a router holding every enabled provider in configuration order.
pub fn build_router(config: &LlmConfig) -> Result<ProviderRouter, ProviderError> {
    let mut router = ProviderRouter::new();
    for provider in config.enabled_providers() {
        info!(
            provider = %provider.name(),
            api_url = %provider.api_url,
            default_model = %provider.default_model,
            api_key = %mask_token(&provider.api_key),
            "Enabling provider"
        );
        router = router.with_provider_disabled_models(
            build_provider(config, provider)?,
            provider.disabled_models.clone(),
        );
    }
    Ok(router)
}
