//! Binary for the FAQ bot.

use anyhow::Result;
use clap::Parser;
use faq_bot::{load_config, print_models, run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_bot(config).await
        }
        Commands::Models => print_models().await,
    }
}
