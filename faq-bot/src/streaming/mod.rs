//! Streaming delivery engine: debounce policy, render fallback, per-chat throttle and the
//! per-answer edit state.

mod debounce;
mod engine;
mod render;
mod throttle;

pub use debounce::DebouncePolicy;
pub use engine::{
    split_pages, DeliveryOutcome, StreamGuard, StreamKey, StreamingEngine, StreamingTarget,
    IN_PROGRESS_MARKER, MAX_MESSAGE_CHARS,
};
pub use render::{edit_with_fallback, RenderOutcome};
pub use throttle::ChatThrottle;
