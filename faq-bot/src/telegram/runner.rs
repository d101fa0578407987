//! REPL runner: converts teloxide messages to core messages and runs the handler chain, one
//! spawned task per message so the REPL never waits on a handler.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use super::adapters::TelegramMessageWrapper;
use crate::chain::HandlerChain;
use crate::core::ToCoreMessage;

/// Resolves the bot username via `get_me`, then runs the teloxide REPL until it stops.
#[instrument(skip(bot, handler_chain, bot_username))]
pub async fn run_repl(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    bot_username: Arc<RwLock<Option<String>>>,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => {
            if let Some(username) = &me.user.username {
                *bot_username.write().await = Some(username.clone());
                info!(username = %username, "Bot username resolved");
            }
        }
        Err(e) => error!(error = %e, "get_me failed; continuing without username"),
    }

    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let chain = handler_chain.clone();
        async move {
            if msg.text().is_none() {
                debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
                return Ok(());
            }
            let core_msg = TelegramMessageWrapper(&msg).to_core();
            tokio::spawn(async move {
                if let Err(e) = chain.handle(&core_msg).await {
                    error!(
                        error = %e,
                        user_id = core_msg.user.id,
                        chat_id = core_msg.chat.id,
                        "Handler chain failed"
                    );
                }
            });
            Ok(())
        }
    })
    .await;

    Ok(())
}
