//! Chat identity.

use serde::{Deserialize, Serialize};

/// Chat (private, group or channel) identity. All per-chat state is keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    pub fn new(id: i64, chat_type: impl Into<String>) -> Self {
        Self {
            id,
            chat_type: chat_type.into(),
        }
    }
}
