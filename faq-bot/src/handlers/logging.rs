//! Logs every inbound message and the chain's final response; never stops the chain.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::core::{Handler, HandlerResponse, Message, Result};

pub struct LoggingHandler;

#[async_trait]
impl Handler for LoggingHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        info!(
            user_id = message.user.id,
            chat_id = message.chat.id,
            username = %message.user.username.as_deref().unwrap_or("unknown"),
            content_len = message.content.chars().count(),
            "Received message"
        );
        Ok(true)
    }

    #[instrument(skip(self, message, response))]
    async fn after(&self, message: &Message, response: &HandlerResponse) -> Result<()> {
        match response {
            HandlerResponse::Reply(text) => debug!(
                message_id = %message.id,
                reply_len = text.chars().count(),
                "Processed message with reply"
            ),
            other => debug!(message_id = %message.id, response = ?other, "Processed message"),
        }
        Ok(())
    }
}
