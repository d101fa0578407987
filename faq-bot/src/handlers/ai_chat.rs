//! AI relay handler: free-form text goes through the conversation manager and the provider
//! router; the answer is rendered progressively into a placeholder message.
//!
//! Per message: throttle check, open cancellation scope, append user turn, send placeholder,
//! route, commit, deliver. Also serves `/reset`, `/status` and `/models`.

use async_trait::async_trait;
use llm_client::{ProviderRouter, RouterError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::conversation::{ConversationManager, TurnStart};
use crate::core::{Bot, Handler, HandlerResponse, Message, Result};
use crate::generation::GenerationScopes;
use crate::streaming::{ChatThrottle, DeliveryOutcome, StreamingEngine};

pub const MSG_ALL_FAILED: &str = "Sorry, no AI backend could answer right now. Please try again later.";
pub const MSG_CANCELLED: &str = "Skipped: a newer message took over.";
pub const MSG_EMPTY_REPLY: &str = "(The model returned an empty answer.)";
pub const MSG_RESET: &str = "Conversation cleared. The next message starts a new one.";
pub const NOTE_IDLE_RESET: &str = "(Previous conversation expired; this is a new one.)";
pub const NOTE_SHOULD_RESET: &str = "(History limit reached, older messages were dropped. Send /reset to start fresh.)";
const MODELS_PER_PROVIDER: usize = 15;

pub struct AiChatHandler {
    bot: Arc<dyn Bot>,
    router: Arc<ProviderRouter>,
    conversations: Arc<ConversationManager>,
    engine: Arc<StreamingEngine>,
    scopes: Arc<GenerationScopes>,
    throttle: ChatThrottle,
    thinking_message: String,
}

/// Reply text with the advisory notes of this turn.
pub fn compose_reply(content: &str, turn: &TurnStart) -> String {
    let body = if content.trim().is_empty() {
        MSG_EMPTY_REPLY
    } else {
        content
    };
    let mut parts = Vec::with_capacity(3);
    if turn.was_reset {
        parts.push(NOTE_IDLE_RESET);
    }
    parts.push(body);
    if turn.should_reset {
        parts.push(NOTE_SHOULD_RESET);
    }
    parts.join("\n\n")
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}

impl AiChatHandler {
    pub fn new(
        bot: Arc<dyn Bot>,
        router: Arc<ProviderRouter>,
        conversations: Arc<ConversationManager>,
        engine: Arc<StreamingEngine>,
        scopes: Arc<GenerationScopes>,
        throttle: ChatThrottle,
        thinking_message: impl Into<String>,
    ) -> Self {
        Self {
            bot,
            router,
            conversations,
            engine,
            scopes,
            throttle,
            thinking_message: thinking_message.into(),
        }
    }

    async fn reply(&self, message: &Message, text: String) -> Result<HandlerResponse> {
        self.bot.reply_to(message, &text).await?;
        Ok(HandlerResponse::Reply(text))
    }

    async fn status_text(&self, chat_id: i64) -> String {
        let provider = match self.conversations.affinity(chat_id).await {
            Some(p) => p,
            None => {
                let default = self.router.default_provider();
                if default.is_empty() {
                    "none".to_string()
                } else {
                    format!("{} (default)", default)
                }
            }
        };
        let max_rounds = self.conversations.settings().max_rounds;
        let rounds_left = self.conversations.remaining_rounds(chat_id).await;
        let idle = match self.conversations.remaining_time(chat_id).await {
            Some(d) => format_duration(d),
            None => "no conversation yet".to_string(),
        };
        let ledger = self.conversations.token_usage(chat_id).await;
        format!(
            "Provider: {}\nRounds left: {}/{}\nResets after idle: {}\nTokens: {} in / {} out",
            provider, rounds_left, max_rounds, idle, ledger.input_total, ledger.output_total
        )
    }

    async fn models_text(&self) -> String {
        let catalog = self.router.catalog().await;
        if catalog.is_empty() {
            return "Model list not loaded yet.".to_string();
        }
        let mut out = String::new();
        for (provider, models) in catalog {
            out.push_str(&format!("{} ({} models)\n", provider, models.len()));
            for m in models.iter().take(MODELS_PER_PROVIDER) {
                if m.display_name == m.id {
                    out.push_str(&format!("  - {}\n", m.id));
                } else {
                    out.push_str(&format!("  - {} ({})\n", m.id, m.display_name));
                }
            }
            if models.len() > MODELS_PER_PROVIDER {
                out.push_str(&format!("  ... {} more\n", models.len() - MODELS_PER_PROVIDER));
            }
        }
        out.trim_end().to_string()
    }

    async fn command(&self, message: &Message, name: &str) -> Result<HandlerResponse> {
        let chat_id = message.chat.id;
        match name {
            "reset" => {
                self.conversations.reset(chat_id).await;
                self.reply(message, MSG_RESET.to_string()).await
            }
            "status" => {
                let text = self.status_text(chat_id).await;
                self.reply(message, text).await
            }
            "models" => {
                let text = self.models_text().await;
                self.reply(message, text).await
            }
            _ => Ok(HandlerResponse::Continue),
        }
    }

    #[instrument(skip(self, message, question), fields(chat_id = message.chat.id, user_id = message.user.id))]
    async fn generate(&self, message: &Message, question: &str, default_provider: String) -> Result<HandlerResponse> {
        let chat = &message.chat;
        let scope = self.scopes.begin(chat.id);

        let turn = self.conversations.begin_turn(chat.id, question).await;
        info!(
            round = turn.round,
            was_reset = turn.was_reset,
            should_reset = turn.should_reset,
            "step: user turn appended"
        );

        let placeholder_id = self
            .bot
            .send_message_and_return_id(chat, &self.thinking_message)
            .await?;
        let stream = self.engine.begin(chat, &placeholder_id);

        let preferred = turn.affinity.clone().unwrap_or(default_provider);
        let routed = self
            .router
            .select_and_chat(&turn.messages, Some(&preferred), scope.token())
            .await;

        match routed {
            Ok(reply) => {
                self.conversations.commit_turn(chat.id, &reply).await;
                let text = compose_reply(&reply.content, &turn);
                info!(provider = %reply.used_provider, reply_len = text.len(), "step: delivering reply");
                match self.engine.deliver(&stream, &text, scope.token()).await {
                    DeliveryOutcome::Completed => Ok(HandlerResponse::Reply(text)),
                    DeliveryOutcome::Cancelled => Ok(HandlerResponse::Stop),
                }
            }
            Err(RouterError::Cancelled) => {
                debug!("Generation cancelled before an answer");
                self.engine.push(stream.key(), MSG_CANCELLED, true).await;
                Ok(HandlerResponse::Stop)
            }
            Err(e) => {
                error!(error = %e, "No provider answered");
                self.engine.push(stream.key(), MSG_ALL_FAILED, true).await;
                Ok(HandlerResponse::Reply(MSG_ALL_FAILED.to_string()))
            }
        }
    }
}

#[async_trait]
impl Handler for AiChatHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if let Some((name, _)) = message.command() {
            return self.command(message, name).await;
        }
        let question = message.content.trim();
        if question.is_empty() {
            return Ok(HandlerResponse::Continue);
        }

        let default_provider = self.router.default_provider();
        if default_provider.is_empty() {
            debug!(chat_id = message.chat.id, "No AI provider enabled; declining");
            return Ok(HandlerResponse::Continue);
        }
        if !self.throttle.try_acquire(message.chat.id) {
            warn!(chat_id = message.chat.id, "Generation rejected by per-chat throttle");
            return Ok(HandlerResponse::Stop);
        }

        self.generate(message, question, default_provider).await
    }
}
