//! # FAQ bot
//!
//! Telegram bot answering FAQ entries and relaying free-form questions to LLM providers.
//! Wires the handler chain, the conversation manager, the streaming edit engine and the
//! admin update wizard. Loads config from env and runs the REPL.

pub mod chain;
pub mod cli;
pub mod components;
pub mod config;
pub mod conversation;
pub mod core;
pub mod faq;
pub mod generation;
pub mod handlers;
pub mod runner;
pub mod streaming;
pub mod telegram;
pub mod wizard;

pub use cli::{load_config, print_models, Cli, Commands};

pub use core::{
    init_tracing, parse_message_id, Bot, BotError, Chat, Handler, HandlerError, HandlerResponse,
    Message, MessageDirection, RenderMode, Result, ToCoreMessage, ToCoreUser, User,
};

pub use chain::HandlerChain;

pub use telegram::{run_repl, TelegramBotAdapter, TelegramMessageWrapper, TelegramUserWrapper};

pub use components::{build_bot_components, build_handler_chain, BotComponents};
pub use config::BotConfig;
pub use runner::{run_bot, FaqBot};
