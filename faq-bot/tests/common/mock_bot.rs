//! Mock implementation of [`faq_bot::Bot`] for integration tests.
//!
//! Records sends and edits so tests can wait for the final edit and assert on the text
//! without hitting Telegram. Render modes can be made to fail and edits can be rate limited.

use async_trait::async_trait;
use faq_bot::{Bot, BotError, Chat, RenderMode, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One recorded call to `edit_message_with_mode`, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub chat_id: i64,
    pub message_id: String,
    pub text: String,
    pub mode: RenderMode,
    pub accepted: bool,
}

/// One message sent by the bot (plain sends, replies and placeholders).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub chat_id: i64,
    pub text: String,
}

pub struct MockBot {
    next_id: AtomicUsize,
    edit_tx: mpsc::UnboundedSender<EditRecord>,
    sent: Mutex<Vec<SentRecord>>,
    rejected_modes: Mutex<HashSet<RenderMode>>,
    rate_limits_left: AtomicUsize,
    retry_after: Duration,
}

impl MockBot {
    /// Hands out ids `"1"`, `"2"`, ... from `send_message_and_return_id` and forwards every
    /// edit attempt to `edit_tx`.
    pub fn new(edit_tx: mpsc::UnboundedSender<EditRecord>) -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            edit_tx,
            sent: Mutex::new(Vec::new()),
            rejected_modes: Mutex::new(HashSet::new()),
            rate_limits_left: AtomicUsize::new(0),
            retry_after: Duration::from_secs(1),
        }
    }

    /// Creates a MockBot and returns the receiver for edit records.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<EditRecord>) {
        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(edit_tx)), edit_rx)
    }

    /// Edits in `mode` fail with a render error.
    pub fn reject_mode(&self, mode: RenderMode) {
        self.rejected_modes.lock().unwrap().insert(mode);
    }

    /// The next `count` edit attempts fail with `RateLimited(retry_after)`.
    pub fn rate_limit_next(&self, count: usize) {
        self.rate_limits_left.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    fn record_send(&self, chat: &Chat, text: &str) {
        self.sent.lock().unwrap().push(SentRecord {
            chat_id: chat.id,
            text: text.to_string(),
        });
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.record_send(chat, text);
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        self.record_send(chat, text);
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn edit_message_with_mode(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        mode: RenderMode,
    ) -> Result<()> {
        let limited = self
            .rate_limits_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        // Telegram refuses over-long text in every mode.
        let too_long = text.chars().count() > 4096;
        let rejected = too_long || self.rejected_modes.lock().unwrap().contains(&mode);
        let _ = self.edit_tx.send(EditRecord {
            chat_id: chat.id,
            message_id: message_id.to_string(),
            text: text.to_string(),
            mode,
            accepted: !limited && !rejected,
        });
        if limited {
            return Err(BotError::RateLimited(self.retry_after));
        }
        if too_long {
            return Err(BotError::Bot("Bad Request: message is too long".to_string()));
        }
        if rejected {
            return Err(BotError::Render(format!("can't parse entities in {:?}", mode)));
        }
        Ok(())
    }
}

/// Drains every record currently queued.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<EditRecord>) -> Vec<EditRecord> {
    let mut out = Vec::new();
    while let Ok(r) = rx.try_recv() {
        out.push(r);
    }
    out
}
