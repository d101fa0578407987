//! BotConfig: base settings, LLM providers and runtime tuning. Use load() for env-based loading.

use anyhow::Result;
use llm_client::LlmConfig;

use super::{AiSettings, BaseConfig, StreamSettings, WizardSettings};

pub struct BotConfig {
    pub base: BaseConfig,
    pub llm: LlmConfig,
    pub ai: AiSettings,
    pub stream: StreamSettings,
    pub wizard: WizardSettings,
}

impl BotConfig {
    /// Loads the full config from environment variables. If `token` is provided it overrides
    /// BOT_TOKEN. Call validate() after load to fail fast before start-up.
    pub fn load(token: Option<String>) -> Result<Self> {
        Ok(Self {
            base: BaseConfig::load(token)?,
            llm: LlmConfig::from_env()?,
            ai: AiSettings::from_env(),
            stream: StreamSettings::from_env(),
            wizard: WizardSettings::from_env(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.llm.validate()
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.base.admin_ids.contains(&user_id)
    }
}
