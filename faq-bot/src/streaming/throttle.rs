//! Per-chat spacing between generation starts.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Rejects a generation that starts within `min_spacing` of the previous accepted start in
/// the same chat. Rejected attempts do not move the window.
pub struct ChatThrottle {
    min_spacing: Duration,
    last_start: DashMap<i64, Instant>,
}

impl ChatThrottle {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_start: DashMap::new(),
        }
    }

    pub fn try_acquire(&self, chat_id: i64) -> bool {
        let now = Instant::now();
        let mut accepted = true;
        self.last_start
            .entry(chat_id)
            .and_modify(|last| {
                if now.duration_since(*last) < self.min_spacing {
                    accepted = false;
                } else {
                    *last = now;
                }
            })
            .or_insert(now);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_spacing_per_chat() {
        let throttle = ChatThrottle::new(Duration::from_millis(1500));
        assert!(throttle.try_acquire(1));
        assert!(!throttle.try_acquire(1));
        assert!(throttle.try_acquire(2));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!throttle.try_acquire(1));

        // The rejected attempt did not move the window.
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(throttle.try_acquire(1));
        assert!(!throttle.try_acquire(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_spacing_never_rejects() {
        let throttle = ChatThrottle::new(Duration::ZERO);
        assert!(throttle.try_acquire(1));
        assert!(throttle.try_acquire(1));
    }
}
