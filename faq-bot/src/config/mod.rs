//! Bot configuration: BaseConfig (Telegram, log, admins) + LlmConfig (providers) + runtime
//! settings for streaming and wizards.

mod base;
mod bot_config;
mod settings;

#[cfg(test)]
mod tests;

pub use base::BaseConfig;
pub use bot_config::BotConfig;
pub use settings::{AiSettings, StreamSettings, WizardSettings};
