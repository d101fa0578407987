//! Per-chat cancellation scopes for AI generations.
//!
//! Starting a generation in a chat cancels the one already running there. Every scope is a
//! child of the root token, so [`GenerationScopes::shutdown`] cancels all of them.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type ScopeMap = DashMap<i64, (u64, CancellationToken)>;

pub struct GenerationScopes {
    root: CancellationToken,
    scopes: Arc<ScopeMap>,
    next_id: AtomicU64,
}

/// Token for one generation. Dropping it unregisters the scope if it is still the current one.
pub struct GenerationScope {
    chat_id: i64,
    id: u64,
    token: CancellationToken,
    scopes: Arc<ScopeMap>,
}

impl GenerationScope {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for GenerationScope {
    fn drop(&mut self) {
        self.scopes
            .remove_if(&self.chat_id, |_, (id, _)| *id == self.id);
    }
}

impl GenerationScopes {
    pub fn new(root: CancellationToken) -> Self {
        Self {
            root,
            scopes: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Opens a scope for `chat_id`, cancelling the superseded one.
    pub fn begin(&self, chat_id: i64) -> GenerationScope {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        if let Some((old_id, old)) = self.scopes.insert(chat_id, (id, token.clone())) {
            debug!(chat_id, superseded = old_id, "Cancelling superseded generation");
            old.cancel();
        }
        GenerationScope {
            chat_id,
            id,
            token,
            scopes: self.scopes.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.scopes.len()
    }

    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
