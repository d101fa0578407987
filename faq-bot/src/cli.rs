//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use llm_client::build_router;

use crate::config::BotConfig;

#[derive(Parser)]
#[command(name = "faq-bot")]
#[command(about = "FAQ and AI relay Telegram bot", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Fetch the model list of every enabled provider once and print it.
    Models,
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}

/// Prints the model catalog. Only the LLM part of the config is needed.
pub async fn print_models() -> Result<()> {
    let llm = llm_client::LlmConfig::from_env()?;
    llm.validate()?;
    let router = build_router(&llm)?;
    let loaded = router.refresh_model_catalog().await;
    if loaded == 0 {
        println!("No provider returned a model list.");
        return Ok(());
    }
    for (provider, models) in router.catalog().await {
        println!("{} ({} models)", provider, models.len());
        for m in models.iter() {
            if m.description.is_empty() {
                println!("  {}", m.id);
            } else {
                println!("  {}  {}", m.id, m.description);
            }
        }
    }
    Ok(())
}
