//! Wraps teloxide::Bot and implements [`crate::core::Bot`].

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, MessageId, ParseMode},
    ApiError, RequestError,
};
use tracing::debug;

use crate::core::{parse_message_id, Bot as CoreBot, BotError, Chat, RenderMode, Result};

/// Thin wrapper around teloxide::Bot that implements the core Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Maps teloxide errors onto the core error kinds the delivery engine distinguishes.
fn map_request_error(e: RequestError) -> BotError {
    match e {
        RequestError::RetryAfter(secs) => BotError::RateLimited(secs.duration()),
        RequestError::Api(ApiError::CantParseEntities(msg)) => BotError::Render(msg),
        other => BotError::Bot(other.to_string()),
    }
}

fn parse_mode(mode: RenderMode) -> Option<ParseMode> {
    match mode {
        RenderMode::MarkdownV2 => Some(ParseMode::MarkdownV2),
        #[allow(deprecated)]
        RenderMode::Markdown => Some(ParseMode::Markdown),
        RenderMode::Plain => None,
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text)
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text)
            .await
            .map_err(map_request_error)?;
        Ok(sent.id.to_string())
    }

    async fn edit_message_with_mode(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        mode: RenderMode,
    ) -> Result<()> {
        let id = parse_message_id(message_id)?;
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat.id), MessageId(id), text);
        if let Some(parse_mode) = parse_mode(mode) {
            request = request.parse_mode(parse_mode);
        }
        match request.await {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!(chat_id = chat.id, message_id = %message_id, "Edit skipped: message not modified");
                Ok(())
            }
            Err(e) => Err(map_request_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_mode_has_no_parse_mode() {
        assert!(parse_mode(RenderMode::Plain).is_none());
        assert_eq!(parse_mode(RenderMode::MarkdownV2), Some(ParseMode::MarkdownV2));
    }

    #[test]
    fn test_cant_parse_entities_maps_to_render_error() {
        let err = map_request_error(RequestError::Api(ApiError::CantParseEntities(
            "Bad Request: can't parse entities".to_string(),
        )));
        assert!(matches!(err, BotError::Render(_)));
    }
}
