//! Admin wizard handler: `/update <id>` walks an admin through changing an FAQ entry's
//! classification and value. While a wizard is open it consumes every message of its chat;
//! only the admin who started it can move it forward, anyone else is ignored.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::{Bot, Handler, HandlerResponse, Message, Result};
use crate::faq::FaqStore;
use crate::wizard::{WizardError, WizardStage, WizardState, WizardStore};

const MSG_NOT_ADMIN: &str = "Only admins can update FAQ entries.";
const MSG_USAGE: &str = "Usage: /update <entry id>";
const MSG_CANCELLED: &str = "Update cancelled.";
const MSG_EMPTY_INPUT: &str = "Please send some text, or /cancel.";

pub struct WizardHandler {
    store: Arc<WizardStore>,
    faq: Arc<dyn FaqStore>,
    bot: Arc<dyn Bot>,
    admin_ids: Vec<i64>,
}

fn stage_prompt(state: &WizardState) -> String {
    match state.stage {
        WizardStage::AwaitingType => format!(
            "Entry {}: current type is \"{}\". Send the new type, or /cancel.",
            state.entry_id, state.old_classification
        ),
        WizardStage::AwaitingValue => format!(
            "Entry {}: type will be \"{}\". Send the new value, /back to change the type, or /cancel.",
            state.entry_id,
            state.new_classification.as_deref().unwrap_or_default()
        ),
    }
}

impl WizardHandler {
    pub fn new(
        store: Arc<WizardStore>,
        faq: Arc<dyn FaqStore>,
        bot: Arc<dyn Bot>,
        admin_ids: Vec<i64>,
    ) -> Self {
        Self {
            store,
            faq,
            bot,
            admin_ids,
        }
    }

    fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    async fn reply(&self, message: &Message, text: String) -> Result<HandlerResponse> {
        self.bot.reply_to(message, &text).await?;
        Ok(HandlerResponse::Reply(text))
    }

    async fn start(&self, message: &Message, args: &str) -> Result<HandlerResponse> {
        if !self.is_admin(message.user.id) {
            warn!(user_id = message.user.id, "Non-admin tried /update");
            return self.reply(message, MSG_NOT_ADMIN.to_string()).await;
        }
        let Ok(entry_id) = args.trim().parse::<i64>() else {
            return self.reply(message, MSG_USAGE.to_string()).await;
        };
        let entry = match self.faq.get(entry_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                return self
                    .reply(message, format!("Entry {} not found.", entry_id))
                    .await
            }
            Err(e) => {
                warn!(error = %e, entry_id, "FAQ read failed");
                return self
                    .reply(message, "Could not read the FAQ store, try again later.".to_string())
                    .await;
            }
        };
        let state = self
            .store
            .start(
                &message.chat,
                message.user.id,
                entry.id,
                &entry.classification,
                &message.id,
            )
            .await;
        self.reply(message, stage_prompt(&state)).await
    }

    async fn step(&self, message: &Message, state: WizardState) -> Result<HandlerResponse> {
        let chat_id = message.chat.id;
        match message.command() {
            Some(("cancel", _)) => {
                self.store.cancel(chat_id).await;
                info!(chat_id, entry_id = state.entry_id, "Wizard cancelled");
                return self.reply(message, MSG_CANCELLED.to_string()).await;
            }
            Some(("back", _)) => {
                return match self.store.back(chat_id).await {
                    Ok(state) => self.reply(message, stage_prompt(&state)).await,
                    Err(e) => self.wizard_gone(message, e).await,
                };
            }
            _ => {}
        }

        let input = message.content.trim();
        if input.is_empty() {
            return self.reply(message, MSG_EMPTY_INPUT.to_string()).await;
        }

        match state.stage {
            WizardStage::AwaitingType => match self.store.advance_to_value(chat_id, input).await {
                Ok(state) => self.reply(message, stage_prompt(&state)).await,
                Err(e) => self.wizard_gone(message, e).await,
            },
            WizardStage::AwaitingValue => {
                let done = match self.store.finish(chat_id).await {
                    Ok(done) => done,
                    Err(e) => return self.wizard_gone(message, e).await,
                };
                let classification = done.new_classification.unwrap_or(done.old_classification);
                match self.faq.update(done.entry_id, &classification, input).await {
                    Ok(entry) => {
                        info!(chat_id, entry_id = entry.id, "FAQ entry updated");
                        self.reply(message, format!("Entry {} updated.", entry.id))
                            .await
                    }
                    Err(e) => {
                        warn!(error = %e, entry_id = done.entry_id, "FAQ update failed");
                        self.reply(message, format!("Could not update entry {}: {}", done.entry_id, e))
                            .await
                    }
                }
            }
        }
    }

    /// The state changed under us (swept or replaced between read and transition).
    async fn wizard_gone(&self, message: &Message, e: WizardError) -> Result<HandlerResponse> {
        warn!(chat_id = message.chat.id, error = %e, "Wizard transition rejected");
        self.reply(message, "The update wizard is no longer active.".to_string())
            .await
    }
}

#[async_trait]
impl Handler for WizardHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, user_id = message.user.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if let Some(("update", args)) = message.command() {
            return self.start(message, args).await;
        }
        match self.store.get(message.chat.id).await {
            Some(state) if state.started_by == message.user.id && self.is_admin(message.user.id) => {
                self.step(message, state).await
            }
            Some(state) => {
                warn!(
                    entry_id = state.entry_id,
                    started_by = state.started_by,
                    "Message from another user while a wizard is open; ignored"
                );
                Ok(HandlerResponse::Stop)
            }
            None => Ok(HandlerResponse::Continue),
        }
    }
}
