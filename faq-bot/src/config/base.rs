//! Base config: Telegram connection, logging, admins and FAQ seed. Loaded from env.

use anyhow::Result;
use llm_client::config::parse_list;
use std::env;

#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE; blank logs to stdout only.
    pub log_file: String,
    /// ADMIN_IDS: users allowed to run admin wizards.
    pub admin_ids: Vec<i64>,
    /// FAQ_SEED_FILE: JSON array of entries loaded at start-up.
    pub faq_seed_file: Option<String>,
}

impl BaseConfig {
    /// Loads from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/faq-bot.log".to_string());
        let admin_ids = env::var("ADMIN_IDS")
            .map(|s| parse_admin_ids(&s))
            .unwrap_or_else(|_| Ok(Vec::new()))?;
        let faq_seed_file = env::var("FAQ_SEED_FILE").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            admin_ids,
            faq_seed_file,
        })
    }

    /// Checks that telegram_api_url, when set, is a valid URL.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        Ok(())
    }
}

fn parse_admin_ids(s: &str) -> Result<Vec<i64>> {
    parse_list(s)
        .iter()
        .map(|id| {
            id.parse::<i64>()
                .map_err(|_| anyhow::anyhow!("ADMIN_IDS contains a non-numeric id: {}", id))
        })
        .collect()
}
