//! Conversation manager: one rolling conversation per chat.

mod manager;

pub use manager::{ConversationManager, ConversationSettings, TokenLedger, TurnStart};
