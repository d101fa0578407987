//! Handlers of the chain: logging, admin wizard, FAQ lookup, AI relay.

mod ai_chat;
mod faq;
mod logging;
mod wizard;

pub use ai_chat::{
    compose_reply, AiChatHandler, MSG_ALL_FAILED, MSG_CANCELLED, MSG_EMPTY_REPLY, MSG_RESET,
    NOTE_IDLE_RESET, NOTE_SHOULD_RESET,
};
pub use faq::FaqHandler;
pub use logging::LoggingHandler;
pub use wizard::WizardHandler;
