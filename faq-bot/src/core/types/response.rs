//! Handler chain result type.

/// Result of one handler's `handle` phase. `Reply(text)` carries the text sent to the user so
/// later handlers can see it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Not for this handler; try next.
    Ignore,
    /// Stop the chain and attach the reply text.
    Reply(String),
}
