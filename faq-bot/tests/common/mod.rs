#![allow(dead_code)]

pub mod fake_provider;
pub mod mock_bot;

use faq_bot::{Chat, Message, User};

pub fn user(id: i64) -> User {
    User {
        id,
        username: Some(format!("user{}", id)),
        first_name: None,
        last_name: None,
    }
}

pub fn private_chat(id: i64) -> Chat {
    Chat::new(id, "private")
}

/// Incoming text from user `user_id` in the private chat with the same id.
pub fn text_message(user_id: i64, message_id: &str, text: &str) -> Message {
    Message::incoming_text(message_id, user(user_id), private_chat(user_id), text)
}
