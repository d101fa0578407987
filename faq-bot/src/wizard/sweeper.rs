//! Background sweep removing expired wizards and telling their chats.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::state::WizardStore;
use crate::core::Bot;

pub const WIZARD_EXPIRED_TEXT: &str = "The update wizard timed out and was closed. Send /update <id> to start again.";

/// One sweep pass at `now`: removes expired states and notifies each chat. Returns how many
/// wizards expired.
pub async fn sweep_and_notify(store: &WizardStore, bot: &Arc<dyn Bot>, now: DateTime<Utc>) -> usize {
    let expired = store.sweep_expired_at(now).await;
    for state in &expired {
        info!(chat_id = state.chat.id, entry_id = state.entry_id, "Wizard expired");
        if let Err(e) = bot.send_message(&state.chat, WIZARD_EXPIRED_TEXT).await {
            warn!(chat_id = state.chat.id, error = %e, "Failed to notify wizard expiry");
        }
    }
    expired.len()
}

/// Sweeps every `interval` until `cancel` fires.
pub fn spawn_wizard_sweeper(
    store: Arc<WizardStore>,
    bot: Arc<dyn Bot>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Wizard sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    sweep_and_notify(&store, &bot, Utc::now()).await;
                }
            }
        }
    })
}
