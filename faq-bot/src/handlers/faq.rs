//! Answers plain text that matches an FAQ key with the entry's value.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::{Bot, Handler, HandlerResponse, Message, Result};
use crate::faq::FaqStore;

pub struct FaqHandler {
    store: Arc<dyn FaqStore>,
    bot: Arc<dyn Bot>,
}

impl FaqHandler {
    pub fn new(store: Arc<dyn FaqStore>, bot: Arc<dyn Bot>) -> Self {
        Self { store, bot }
    }
}

#[async_trait]
impl Handler for FaqHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.command().is_some() || message.content.trim().is_empty() {
            return Ok(HandlerResponse::Continue);
        }
        let entry = match self.store.find_by_key(&message.content).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(HandlerResponse::Continue),
            Err(e) => {
                warn!(error = %e, "FAQ lookup failed; passing on");
                return Ok(HandlerResponse::Continue);
            }
        };
        info!(entry_id = entry.id, "FAQ hit");
        self.bot.reply_to(message, &entry.value).await?;
        Ok(HandlerResponse::Reply(entry.value))
    }
}
