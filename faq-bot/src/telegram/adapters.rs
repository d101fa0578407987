//! Conversions from teloxide types to core types.

use crate::core::{Chat, Message, MessageDirection, ToCoreMessage, ToCoreUser, User};

pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl ToCoreUser for TelegramUserWrapper<'_> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl ToCoreMessage for TelegramMessageWrapper<'_> {
    fn to_core(&self) -> Message {
        let msg = self.0;
        let user = msg
            .from
            .as_ref()
            .map(|u| TelegramUserWrapper(u).to_core())
            .unwrap_or(User {
                id: 0,
                username: None,
                first_name: None,
                last_name: None,
            });
        let chat_type = if msg.chat.is_private() {
            "private"
        } else if msg.chat.is_group() || msg.chat.is_supergroup() {
            "group"
        } else {
            "channel"
        };
        Message {
            id: msg.id.to_string(),
            user,
            chat: Chat::new(msg.chat.id.0, chat_type),
            content: msg.text().unwrap_or("").to_string(),
            message_type: if msg.text().is_some() { "text" } else { "other" }.to_string(),
            direction: MessageDirection::Incoming,
            created_at: msg.date,
            reply_to_message_id: msg.reply_to_message().map(|m| m.id.to_string()),
        }
    }
}
