//! Admin wizard state machine, one state per chat.
//!
//! ```text
//! none --start--> AwaitingType --type--> AwaitingValue --value--> none
//!                      ^                      |
//!                      +-------- back --------+
//! any stage --cancel / expiry--> none
//! ```
//!
//! Expiry is measured from creation and is unaffected by transitions.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::Chat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    /// Waiting for the new classification.
    AwaitingType,
    /// Waiting for the new value.
    AwaitingValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub chat: Chat,
    /// Admin who opened the wizard; only their messages drive it.
    pub started_by: i64,
    pub stage: WizardStage,
    pub entry_id: i64,
    pub old_classification: String,
    pub new_classification: Option<String>,
    /// Message the wizard was started from.
    pub message_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WizardError {
    #[error("no wizard is active in chat {0}")]
    NotActive(i64),

    #[error("wizard is at {actual:?}, expected {expected:?}")]
    WrongStage {
        expected: WizardStage,
        actual: WizardStage,
    },
}

pub struct WizardStore {
    timeout: Duration,
    states: RwLock<HashMap<i64, WizardState>>,
}

impl WizardStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            states: RwLock::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn start(
        &self,
        chat: &Chat,
        started_by: i64,
        entry_id: i64,
        old_classification: &str,
        message_id: &str,
    ) -> WizardState {
        self.start_at(chat, started_by, entry_id, old_classification, message_id, Utc::now())
            .await
    }

    /// Opens a wizard at [`WizardStage::AwaitingType`]. An existing wizard in the chat is
    /// replaced without notice.
    pub async fn start_at(
        &self,
        chat: &Chat,
        started_by: i64,
        entry_id: i64,
        old_classification: &str,
        message_id: &str,
        now: DateTime<Utc>,
    ) -> WizardState {
        let state = WizardState {
            chat: chat.clone(),
            started_by,
            stage: WizardStage::AwaitingType,
            entry_id,
            old_classification: old_classification.to_string(),
            new_classification: None,
            message_id: message_id.to_string(),
            created_at: now,
        };
        if let Some(previous) = self.states.write().await.insert(chat.id, state.clone()) {
            debug!(chat_id = chat.id, previous_entry = previous.entry_id, "Wizard replaced");
        }
        info!(chat_id = chat.id, started_by, entry_id, "Wizard started");
        state
    }

    pub async fn get(&self, chat_id: i64) -> Option<WizardState> {
        self.states.read().await.get(&chat_id).cloned()
    }

    pub async fn is_active(&self, chat_id: i64) -> bool {
        self.states.read().await.contains_key(&chat_id)
    }

    /// AwaitingType -> AwaitingValue, recording the new classification.
    pub async fn advance_to_value(&self, chat_id: i64, classification: &str) -> Result<WizardState, WizardError> {
        let mut states = self.states.write().await;
        let state = states.get_mut(&chat_id).ok_or(WizardError::NotActive(chat_id))?;
        expect_stage(state, WizardStage::AwaitingType)?;
        state.new_classification = Some(classification.to_string());
        state.stage = WizardStage::AwaitingValue;
        Ok(state.clone())
    }

    /// Re-enters the earlier stage. At the first stage this is a no-op.
    pub async fn back(&self, chat_id: i64) -> Result<WizardState, WizardError> {
        let mut states = self.states.write().await;
        let state = states.get_mut(&chat_id).ok_or(WizardError::NotActive(chat_id))?;
        if state.stage == WizardStage::AwaitingValue {
            state.stage = WizardStage::AwaitingType;
            state.new_classification = None;
        }
        Ok(state.clone())
    }

    /// Completes the wizard at AwaitingValue and removes it. The returned state carries the
    /// chosen classification.
    pub async fn finish(&self, chat_id: i64) -> Result<WizardState, WizardError> {
        let mut states = self.states.write().await;
        let state = states.get(&chat_id).ok_or(WizardError::NotActive(chat_id))?;
        expect_stage(state, WizardStage::AwaitingValue)?;
        states.remove(&chat_id).ok_or(WizardError::NotActive(chat_id))
    }

    /// Removes the wizard from any stage.
    pub async fn cancel(&self, chat_id: i64) -> Option<WizardState> {
        self.states.write().await.remove(&chat_id)
    }

    pub async fn sweep_expired(&self) -> Vec<WizardState> {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Removes and returns every state with `now - created_at >= timeout`. Holds the write
    /// lock for the whole pass.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> Vec<WizardState> {
        let mut states = self.states.write().await;
        let expired_ids: Vec<i64> = states
            .values()
            .filter(|s| self.is_expired(s, now))
            .map(|s| s.chat.id)
            .collect();
        expired_ids
            .into_iter()
            .filter_map(|id| states.remove(&id))
            .collect()
    }

    fn is_expired(&self, state: &WizardState, now: DateTime<Utc>) -> bool {
        let age = (now - state.created_at).to_std().unwrap_or(Duration::ZERO);
        age >= self.timeout
    }
}

fn expect_stage(state: &WizardState, expected: WizardStage) -> Result<(), WizardError> {
    if state.stage == expected {
        Ok(())
    } else {
        Err(WizardError::WrongStage {
            expected,
            actual: state.stage,
        })
    }
}
