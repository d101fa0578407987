//! Per-chat conversation state: rolling history, idle reset, round truncation, provider
//! affinity and token ledger.
//!
//! A turn is two calls: [`ConversationManager::begin_turn`] appends the user message and
//! returns the prompt, [`ConversationManager::commit_turn`] appends the reply after the
//! provider answered. A failed provider call simply never commits, so the user message stays.

use chrono::{DateTime, Utc};
use llm_client::{ChatMessage, LlmConfig, RoutedReply};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Limits applied to every conversation.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub system_prompt: Option<String>,
    /// Rounds (user + assistant pairs) kept before truncation.
    pub max_rounds: usize,
    pub idle_timeout: Duration,
}

impl ConversationSettings {
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            max_rounds: config.history_length.max(1),
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Token totals for one conversation. Only grows; zeroed when the conversation resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenLedger {
    pub input_total: u64,
    pub output_total: u64,
}

#[derive(Debug, Clone)]
struct Conversation {
    history: Vec<ChatMessage>,
    last_updated: DateTime<Utc>,
    affinity: Option<String>,
    ledger: TokenLedger,
}

impl Conversation {
    fn new(system_prompt: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            history: system_prompt
                .map(|p| vec![ChatMessage::system(p)])
                .unwrap_or_default(),
            last_updated: now,
            affinity: None,
            ledger: TokenLedger::default(),
        }
    }

    fn non_system_count(&self) -> usize {
        self.history.iter().filter(|m| !m.is_system()).count()
    }

    fn rounds(&self) -> usize {
        self.non_system_count().div_ceil(2)
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_updated).to_std().unwrap_or(Duration::ZERO)
    }

    /// Keeps every system message and the newest `keep` non-system messages, order preserved.
    fn truncate_to(&mut self, keep: usize) {
        let excess = self.non_system_count().saturating_sub(keep);
        if excess == 0 {
            return;
        }
        let mut dropped = 0;
        self.history.retain(|m| {
            if m.is_system() || dropped >= excess {
                true
            } else {
                dropped += 1;
                false
            }
        });
    }
}

/// Result of [`ConversationManager::begin_turn`].
#[derive(Debug, Clone)]
pub struct TurnStart {
    /// Prompt to send: system messages plus the (possibly truncated) dialogue ending with the
    /// new user message.
    pub messages: Vec<ChatMessage>,
    /// Provider that answered the previous turn, tried first.
    pub affinity: Option<String>,
    /// The conversation was idle longer than the timeout and started over.
    pub was_reset: bool,
    /// Round limit exceeded; advisory only, truncation already happened.
    pub should_reset: bool,
    pub round: usize,
}

/// Owns every chat's conversation behind one reader/writer lock.
pub struct ConversationManager {
    settings: ConversationSettings,
    conversations: RwLock<HashMap<i64, Conversation>>,
}

impl ConversationManager {
    pub fn new(settings: ConversationSettings) -> Self {
        Self {
            settings,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub async fn begin_turn(&self, chat_id: i64, user_text: &str) -> TurnStart {
        self.begin_turn_at(chat_id, user_text, Utc::now()).await
    }

    /// Creates or idle-resets the conversation, appends the user message and enforces the
    /// round limit.
    pub async fn begin_turn_at(&self, chat_id: i64, user_text: &str, now: DateTime<Utc>) -> TurnStart {
        let system_prompt = self.settings.system_prompt.as_deref();
        let max_rounds = self.settings.max_rounds;
        let mut conversations = self.conversations.write().await;

        let mut was_reset = false;
        let conversation = conversations.entry(chat_id).or_insert_with(|| {
            debug!(chat_id, "Creating conversation");
            Conversation::new(system_prompt, now)
        });
        if conversation.idle_for(now) > self.settings.idle_timeout {
            info!(
                chat_id,
                idle_secs = conversation.idle_for(now).as_secs(),
                "Conversation idle past timeout; resetting"
            );
            *conversation = Conversation::new(system_prompt, now);
            was_reset = true;
        }

        conversation.history.push(ChatMessage::user(user_text));
        let round = conversation.rounds();
        let should_reset = round > max_rounds;
        if should_reset {
            conversation.truncate_to(max_rounds * 2);
            debug!(chat_id, round, max_rounds, "Round limit exceeded; history truncated");
        }

        TurnStart {
            messages: conversation.history.clone(),
            affinity: conversation.affinity.clone(),
            was_reset,
            should_reset,
            round,
        }
    }

    pub async fn commit_turn(&self, chat_id: i64, reply: &RoutedReply) {
        self.commit_turn_at(chat_id, reply, Utc::now()).await
    }

    /// Appends the assistant reply, refreshes activity, pins affinity and adds the tokens.
    pub async fn commit_turn_at(&self, chat_id: i64, reply: &RoutedReply, now: DateTime<Utc>) {
        let mut conversations = self.conversations.write().await;
        let Some(conversation) = conversations.get_mut(&chat_id) else {
            warn!(chat_id, "Commit for unknown conversation ignored");
            return;
        };
        conversation
            .history
            .push(ChatMessage::assistant(reply.content.clone()));
        conversation.last_updated = now;
        conversation.affinity = Some(reply.used_provider.clone());
        conversation.ledger.input_total += reply.input_tokens;
        conversation.ledger.output_total += reply.output_tokens;
        debug!(
            chat_id,
            provider = %reply.used_provider,
            input_total = conversation.ledger.input_total,
            output_total = conversation.ledger.output_total,
            "Turn committed"
        );
    }

    /// Explicit reset: drops the dialogue, re-seeds the system prompt, clears affinity and ledger.
    pub async fn reset(&self, chat_id: i64) {
        let conversation = Conversation::new(self.settings.system_prompt.as_deref(), Utc::now());
        self.conversations.write().await.insert(chat_id, conversation);
        info!(chat_id, "Conversation reset");
    }

    pub async fn remaining_time(&self, chat_id: i64) -> Option<Duration> {
        self.remaining_time_at(chat_id, Utc::now()).await
    }

    /// Time until the idle reset; `None` when the chat has no conversation yet.
    pub async fn remaining_time_at(&self, chat_id: i64, now: DateTime<Utc>) -> Option<Duration> {
        let conversations = self.conversations.read().await;
        conversations
            .get(&chat_id)
            .map(|c| self.settings.idle_timeout.saturating_sub(c.idle_for(now)))
    }

    pub async fn remaining_rounds(&self, chat_id: i64) -> usize {
        let used = self.rounds(chat_id).await;
        self.settings.max_rounds.saturating_sub(used)
    }

    pub async fn rounds(&self, chat_id: i64) -> usize {
        let conversations = self.conversations.read().await;
        conversations.get(&chat_id).map_or(0, Conversation::rounds)
    }

    pub async fn token_usage(&self, chat_id: i64) -> TokenLedger {
        let conversations = self.conversations.read().await;
        conversations
            .get(&chat_id)
            .map(|c| c.ledger)
            .unwrap_or_default()
    }

    pub async fn affinity(&self, chat_id: i64) -> Option<String> {
        let conversations = self.conversations.read().await;
        conversations.get(&chat_id).and_then(|c| c.affinity.clone())
    }

    /// Snapshot of the history, oldest first.
    pub async fn history(&self, chat_id: i64) -> Vec<ChatMessage> {
        let conversations = self.conversations.read().await;
        conversations
            .get(&chat_id)
            .map(|c| c.history.clone())
            .unwrap_or_default()
    }
}
