use anyhow::Result;
use llm_client::spawn_catalog_refresher;
use tracing::{error, info, instrument};

use crate::chain::HandlerChain;
use crate::components::{build_bot_components, build_handler_chain, BotComponents};
use crate::config::BotConfig;
use crate::core::{init_tracing, Message as CoreMessage};
use crate::telegram::run_repl;
use crate::wizard::spawn_wizard_sweeper;

/// FaqBot: config, components and handler chain, without the REPL. Integration tests drive
/// it with core messages.
pub struct FaqBot {
    pub config: BotConfig,
    pub components: BotComponents,
    pub handler_chain: HandlerChain,
}

impl FaqBot {
    pub fn new(config: BotConfig, components: BotComponents) -> Self {
        let handler_chain = build_handler_chain(&config, &components);
        Self {
            config,
            components,
            handler_chain,
        }
    }

    /// Drive the handler chain with a core Message (for integration tests).
    #[doc(hidden)]
    pub async fn handle_core_message(&self, message: &CoreMessage) -> Result<()> {
        if let Err(e) = self.handler_chain.handle(message).await {
            error!(error = %e, user_id = message.user.id, "Handler chain failed");
        }
        Ok(())
    }
}

/// Main entry: validate config, init logging, build components, start the background tasks,
/// then run the REPL. Cancels generations and background tasks when the REPL returns.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    info!(
        admins = config.base.admin_ids.len(),
        providers = config.llm.enabled_providers().count(),
        "Initializing bot"
    );

    let components = build_bot_components(&config, None).await?;
    let handler_chain = build_handler_chain(&config, &components);

    let refresher = spawn_catalog_refresher(
        components.router.clone(),
        config.ai.model_refresh_interval(),
        components.shutdown.child_token(),
    );
    let sweeper = spawn_wizard_sweeper(
        components.wizards.clone(),
        components.bot.clone(),
        config.wizard.sweep_interval(),
        components.shutdown.child_token(),
    );

    info!("Bot started successfully");
    let result = run_repl(
        components.teloxide_bot.clone(),
        handler_chain,
        components.bot_username.clone(),
    )
    .await;

    info!("REPL stopped; shutting down");
    components.scopes.shutdown();
    components.shutdown.cancel();
    let _ = tokio::join!(refresher, sweeper);
    result
}
