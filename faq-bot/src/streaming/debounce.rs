//! Debounce rule deciding when a partial answer is worth an edit.

use std::time::Duration;

/// Edit thresholds. Lengths are in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    pub min_chars: usize,
    pub min_interval: Duration,
}

impl DebouncePolicy {
    pub fn new(min_chars: usize, min_interval: Duration) -> Self {
        Self {
            min_chars,
            min_interval,
        }
    }

    /// `old_len`/`new_len` are the last rendered and the candidate lengths, `elapsed` the time
    /// since the last edit. Edits when any of these holds:
    ///
    /// 1. the answer is complete;
    /// 2. growth reached `min_chars` and `min_interval` passed;
    /// 3. `3 * min_interval` passed, whatever the growth;
    /// 4. growth reached `2 * min_chars`.
    pub fn should_edit(&self, old_len: usize, new_len: usize, elapsed: Duration, complete: bool) -> bool {
        if complete {
            return true;
        }
        let grown = new_len.saturating_sub(old_len);
        if grown >= 2 * self.min_chars {
            return true;
        }
        if grown >= self.min_chars && elapsed >= self.min_interval {
            return true;
        }
        elapsed >= self.min_interval * 3
    }
}
