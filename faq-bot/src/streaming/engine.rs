//! Streaming delivery: renders one finished model answer progressively into an already-sent
//! message through debounced edits.
//!
//! Each in-flight answer owns a [`StreamingTarget`] in a concurrent map, keyed by chat and
//! message id, each behind its own async mutex. The target lives exactly as long as its
//! [`StreamGuard`]; dropping the guard (normal return, error or panic unwind) removes it.
//!
//! Telegram rejects messages longer than [`MAX_MESSAGE_CHARS`]. Edits are capped to that
//! length, and longer answers continue in follow-up messages.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::debounce::DebouncePolicy;
use super::render::{edit_with_fallback, RenderOutcome};
use crate::config::StreamSettings;
use crate::core::{Bot, Chat, RenderMode};

/// Appended to non-final renders.
pub const IN_PROGRESS_MARKER: &str = " ▌";

/// Telegram's limit on the text of one message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest prefix of `text` with at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Splits `text` into pages of at most `max_chars` characters. Always yields at least one
/// page.
pub fn split_pages(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut pages = Vec::new();
    let mut rest = text;
    loop {
        let page = truncate_chars(rest, max_chars);
        pages.push(page);
        rest = &rest[page.len()..];
        if rest.is_empty() {
            return pages;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub chat_id: i64,
    pub message_id: String,
}

/// Edit state of one outgoing answer.
#[derive(Debug)]
pub struct StreamingTarget {
    pub chat: Chat,
    pub message_id: String,
    /// Content of the last successful edit, without the marker.
    pub last_rendered: String,
    pub last_edit: Instant,
    pub edits: usize,
    /// Richest mode that still renders; downgrades stick for the rest of the stream.
    mode: RenderMode,
}

type TargetMap = DashMap<StreamKey, Arc<Mutex<StreamingTarget>>>;

/// Removes its target from the engine when dropped.
pub struct StreamGuard {
    key: StreamKey,
    targets: Arc<TargetMap>,
}

impl StreamGuard {
    pub fn key(&self) -> &StreamKey {
        &self.key
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.targets.remove(&self.key).is_some() {
            debug!(chat_id = self.key.chat_id, message_id = %self.key.message_id, "Stream target removed");
        }
    }
}

/// How [`StreamingEngine::deliver`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Completed,
    /// The generation was superseded or the bot is shutting down.
    Cancelled,
}

pub struct StreamingEngine {
    bot: Arc<dyn Bot>,
    policy: DebouncePolicy,
    chunk_chars: usize,
    chunk_delay: Duration,
    targets: Arc<TargetMap>,
}

impl StreamingEngine {
    pub fn new(bot: Arc<dyn Bot>, settings: &StreamSettings) -> Self {
        Self {
            bot,
            policy: DebouncePolicy::new(
                settings.min_chars,
                Duration::from_millis(settings.min_interval_ms),
            ),
            chunk_chars: settings.chunk_chars.max(1),
            chunk_delay: Duration::from_millis(settings.chunk_delay_ms),
            targets: Arc::new(DashMap::new()),
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    /// Registers the target for a placeholder that was just sent. Replaces any stale target
    /// with the same key.
    pub fn begin(&self, chat: &Chat, message_id: &str) -> StreamGuard {
        let key = StreamKey {
            chat_id: chat.id,
            message_id: message_id.to_string(),
        };
        let target = StreamingTarget {
            chat: chat.clone(),
            message_id: message_id.to_string(),
            last_rendered: String::new(),
            last_edit: Instant::now(),
            edits: 0,
            mode: RenderMode::MarkdownV2,
        };
        self.targets
            .insert(key.clone(), Arc::new(Mutex::new(target)));
        StreamGuard {
            key,
            targets: self.targets.clone(),
        }
    }

    pub fn active_streams(&self) -> usize {
        self.targets.len()
    }

    pub fn is_active(&self, key: &StreamKey) -> bool {
        self.targets.contains_key(key)
    }

    /// Offers new content for a target. Edits when the debounce policy allows; returns whether
    /// an edit was sent. Unknown keys are ignored. Content is cut so that the edit, marker
    /// included, stays within [`MAX_MESSAGE_CHARS`].
    pub async fn push(&self, key: &StreamKey, content: &str, complete: bool) -> bool {
        let Some(target) = self.targets.get(key).map(|t| t.value().clone()) else {
            debug!(chat_id = key.chat_id, "Push for finished stream ignored");
            return false;
        };
        let mut target = target.lock().await;

        let cap = if complete {
            MAX_MESSAGE_CHARS
        } else {
            MAX_MESSAGE_CHARS - IN_PROGRESS_MARKER.chars().count()
        };
        let content = truncate_chars(content, cap);

        let old_len = target.last_rendered.chars().count();
        let new_len = content.chars().count();
        if !self
            .policy
            .should_edit(old_len, new_len, target.last_edit.elapsed(), complete)
        {
            return false;
        }

        let text = if complete {
            content.to_string()
        } else {
            format!("{}{}", content, IN_PROGRESS_MARKER)
        };
        let outcome =
            edit_with_fallback(&self.bot, &target.chat, &target.message_id, &text, target.mode)
                .await;
        target.last_edit = Instant::now();
        match outcome {
            RenderOutcome::Rendered(mode) => {
                target.mode = mode;
                target.last_rendered = content.to_string();
                target.edits += 1;
                true
            }
            RenderOutcome::Dropped => false,
        }
    }

    /// Reveals `full_text` in `chunk_chars` steps separated by `chunk_delay`, pushing each
    /// prefix through the debounce policy, then sends the final edit without the marker.
    /// Text past [`MAX_MESSAGE_CHARS`] is sent as follow-up messages after the final edit.
    ///
    /// On cancellation the text rendered so far is finalized (marker removed) and no further
    /// content is shown.
    #[instrument(skip(self, guard, full_text, cancel), fields(chat_id = guard.key.chat_id, len = full_text.len()))]
    pub async fn deliver(
        &self,
        guard: &StreamGuard,
        full_text: &str,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        let key = guard.key();
        let pages = split_pages(full_text, MAX_MESSAGE_CHARS);
        let first = pages[0];
        let boundaries: Vec<usize> = first
            .char_indices()
            .map(|(i, _)| i)
            .skip(self.chunk_chars)
            .step_by(self.chunk_chars)
            .collect();

        for end in boundaries {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.finalize_partial(key).await;
                    info!("Delivery cancelled");
                    return DeliveryOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.chunk_delay) => {}
            }
            self.push(key, &first[..end], false).await;
        }

        if cancel.is_cancelled() {
            self.finalize_partial(key).await;
            return DeliveryOutcome::Cancelled;
        }
        self.push(key, first, true).await;
        self.send_overflow(key, &pages[1..], cancel).await
    }

    /// Sends the pages that did not fit into the streamed message, in order.
    async fn send_overflow(
        &self,
        key: &StreamKey,
        pages: &[&str],
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        if pages.is_empty() {
            return DeliveryOutcome::Completed;
        }
        let chat = match self.targets.get(key).map(|t| t.value().clone()) {
            Some(target) => target.lock().await.chat.clone(),
            None => return DeliveryOutcome::Completed,
        };
        info!(extra_pages = pages.len(), "Answer exceeds one message; sending the rest");
        for page in pages {
            if cancel.is_cancelled() {
                info!("Delivery cancelled between pages");
                return DeliveryOutcome::Cancelled;
            }
            if let Err(e) = self.bot.send_message(&chat, page).await {
                warn!(chat_id = chat.id, error = %e, "Follow-up page failed; stopping");
                break;
            }
        }
        DeliveryOutcome::Completed
    }

    async fn finalize_partial(&self, key: &StreamKey) {
        let rendered = match self.targets.get(key).map(|t| t.value().clone()) {
            Some(target) => target.lock().await.last_rendered.clone(),
            None => return,
        };
        if !rendered.is_empty() {
            self.push(key, &rendered, true).await;
        }
    }
}
