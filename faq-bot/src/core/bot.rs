//! Transport abstraction for sending and editing messages.
//!
//! [`Bot`] is transport-agnostic; the teloxide implementation lives in
//! [`crate::telegram::TelegramBotAdapter`].

use async_trait::async_trait;

use super::error::{BotError, Result};
use super::types::{Chat, Message};

/// Formatting applied by the transport when rendering message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    MarkdownV2,
    Markdown,
    Plain,
}

impl RenderMode {
    /// Rich modes first, plain text last.
    pub const FALLBACK_ORDER: [RenderMode; 3] =
        [RenderMode::MarkdownV2, RenderMode::Markdown, RenderMode::Plain];
}

/// Sends and edits messages. `message_id` is transport-specific (Telegram: numeric string).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a plain text message to the chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends a message and returns its id for later edits.
    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String>;

    /// Edits an already-sent message using the given render mode.
    ///
    /// Implementations report formatting rejections as [`BotError::Render`] and rate limits as
    /// [`BotError::RateLimited`]. An unchanged text is not an error.
    async fn edit_message_with_mode(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        mode: RenderMode,
    ) -> Result<()>;

    /// Sends a reply in the message's chat.
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }

    /// Edits an already-sent message as plain text.
    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        self.edit_message_with_mode(chat, message_id, text, RenderMode::Plain)
            .await
    }
}

/// Parses a message id string into an i32.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| BotError::Bot(format!("Invalid message_id for edit: {}", s)))
}
