//! Component factory: builds the shared state and the handler chain from config.

use anyhow::Result;
use llm_client::{build_router, ProviderRouter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::chain::HandlerChain;
use crate::config::BotConfig;
use crate::conversation::{ConversationManager, ConversationSettings};
use crate::core::Bot;
use crate::faq::{FaqStore, InMemoryFaqStore};
use crate::generation::GenerationScopes;
use crate::handlers::{AiChatHandler, FaqHandler, LoggingHandler, WizardHandler};
use crate::streaming::{ChatThrottle, StreamingEngine};
use crate::telegram::TelegramBotAdapter;
use crate::wizard::WizardStore;

/// Everything the handlers and background tasks share. Built once, shared by `Arc`.
#[derive(Clone)]
pub struct BotComponents {
    pub teloxide_bot: teloxide::Bot,
    /// Transport used by handlers; the teloxide adapter unless overridden (tests).
    pub bot: Arc<dyn Bot>,
    pub bot_username: Arc<RwLock<Option<String>>>,
    pub router: Arc<ProviderRouter>,
    pub conversations: Arc<ConversationManager>,
    pub engine: Arc<StreamingEngine>,
    pub wizards: Arc<WizardStore>,
    pub faq: Arc<dyn FaqStore>,
    pub scopes: Arc<GenerationScopes>,
    /// Root token: cancels generations and background tasks on shutdown.
    pub shutdown: CancellationToken,
}

fn build_teloxide_bot(config: &BotConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token());
    match config.telegram_api_url() {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

async fn build_faq_store(config: &BotConfig) -> Result<Arc<dyn FaqStore>> {
    match &config.base.faq_seed_file {
        Some(path) => {
            let store = InMemoryFaqStore::from_seed_file(path).await.map_err(|e| {
                error!(error = %e, path = %path, "Failed to load FAQ seed");
                anyhow::anyhow!("Failed to load FAQ seed {}: {}", path, e)
            })?;
            Ok(Arc::new(store))
        }
        None => {
            info!("No FAQ_SEED_FILE; starting with an empty FAQ store");
            Ok(Arc::new(InMemoryFaqStore::new()))
        }
    }
}

/// Builds all components. `handler_bot_override` replaces the Telegram transport (tests).
#[instrument(skip(config, handler_bot_override))]
pub async fn build_bot_components(
    config: &BotConfig,
    handler_bot_override: Option<Arc<dyn Bot>>,
) -> Result<BotComponents> {
    let teloxide_bot = build_teloxide_bot(config);
    let bot: Arc<dyn Bot> = handler_bot_override
        .unwrap_or_else(|| Arc::new(TelegramBotAdapter::new(teloxide_bot.clone())));

    let router = Arc::new(build_router(&config.llm)?);
    info!(providers = ?router.provider_names(), default = %router.default_provider(), "Provider router ready");

    let shutdown = CancellationToken::new();
    Ok(BotComponents {
        teloxide_bot,
        bot: bot.clone(),
        bot_username: Arc::new(RwLock::new(None)),
        router,
        conversations: Arc::new(ConversationManager::new(
            ConversationSettings::from_llm_config(&config.llm),
        )),
        engine: Arc::new(StreamingEngine::new(bot, &config.stream)),
        wizards: Arc::new(WizardStore::new(config.wizard.timeout())),
        faq: build_faq_store(config).await?,
        scopes: Arc::new(GenerationScopes::new(shutdown.clone())),
        shutdown,
    })
}

/// logging → wizard → FAQ lookup → AI relay.
pub fn build_handler_chain(config: &BotConfig, components: &BotComponents) -> HandlerChain {
    let ai = AiChatHandler::new(
        components.bot.clone(),
        components.router.clone(),
        components.conversations.clone(),
        components.engine.clone(),
        components.scopes.clone(),
        ChatThrottle::new(Duration::from_millis(config.stream.chat_min_spacing_ms)),
        config.ai.thinking_message.clone(),
    );
    HandlerChain::new()
        .add_handler(Arc::new(LoggingHandler))
        .add_handler(Arc::new(WizardHandler::new(
            components.wizards.clone(),
            components.faq.clone(),
            components.bot.clone(),
            config.base.admin_ids.clone(),
        )))
        .add_handler(Arc::new(FaqHandler::new(
            components.faq.clone(),
            components.bot.clone(),
        )))
        .add_handler(Arc::new(ai))
}
