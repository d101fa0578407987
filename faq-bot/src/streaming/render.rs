//! Edit with render-mode fallback: MarkdownV2, then Markdown, then plain text.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::{Bot, BotError, Chat, RenderMode};

/// What happened to one edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderMode),
    /// Every mode failed; the edit was skipped.
    Dropped,
}

/// Tries each mode of [`RenderMode::FALLBACK_ORDER`] starting at `start`. A rejected mode
/// downgrades to the next one. A rate limit is waited out and retried once per call; a second
/// one drops the edit.
pub async fn edit_with_fallback(
    bot: &Arc<dyn Bot>,
    chat: &Chat,
    message_id: &str,
    text: &str,
    start: RenderMode,
) -> RenderOutcome {
    let modes = RenderMode::FALLBACK_ORDER
        .iter()
        .copied()
        .skip_while(|m| *m != start);
    let mut waited = false;

    for mode in modes {
        loop {
            match bot.edit_message_with_mode(chat, message_id, text, mode).await {
                Ok(()) => return RenderOutcome::Rendered(mode),
                Err(BotError::RateLimited(wait)) if !waited => {
                    debug!(chat_id = chat.id, wait_ms = wait.as_millis() as u64, "Edit rate limited; waiting once");
                    waited = true;
                    tokio::time::sleep(wait).await;
                }
                Err(BotError::RateLimited(_)) => {
                    warn!(chat_id = chat.id, message_id = %message_id, "Edit rate limited again; dropping edit");
                    return RenderOutcome::Dropped;
                }
                Err(e) => {
                    debug!(chat_id = chat.id, mode = ?mode, error = %e, "Edit failed in this mode; downgrading");
                    break;
                }
            }
        }
    }

    warn!(chat_id = chat.id, message_id = %message_id, "All render modes failed; edit dropped");
    RenderOutcome::Dropped
}
