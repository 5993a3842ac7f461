use crate::demo;
use crate::error::{Error, Result};
use crate::models::{Chat, ChatMessage};
use crate::storage::{read_list, try_read_list, write_list, KeyValueStore};
use chrono::{DateTime, Utc};
use log::{debug, info};
use uuid::Uuid;

const CHATS_KEY: &str = "chats";

fn messages_key(chat_id: &str) -> String {
    format!("chat_messages:{}", chat_id)
}

// Each conversation's messages form an append-only log under its own key.
pub struct ChatStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ChatStore<S> {
    pub fn new(store: S) -> Self {
        ChatStore { store }
    }

    pub fn chats_for(&self, user_id: &str) -> Vec<Chat> {
        let mut chats: Vec<Chat> = self
            .all_chats()
            .into_iter()
            .filter(|chat| chat.has_participant(user_id))
            .collect();
        chats.sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp));
        chats
    }

    pub fn get_chat(&self, chat_id: &str) -> Option<Chat> {
        self.all_chats().into_iter().find(|chat| chat.id == chat_id)
    }

    pub fn messages(&self, chat_id: &str) -> Vec<ChatMessage> {
        read_list(&self.store, &messages_key(chat_id))
    }

    pub fn open_chat(&self, user_id: &str, other_id: &str, item_id: Option<&str>) -> Result<Chat> {
        if user_id == other_id {
            return Err(Error::Validation("You cannot start a chat with yourself".to_string()));
        }
        let mut chats = self.try_all_chats()?;
        if let Some(existing) = chats.iter().find(|chat| {
            chat.has_participant(user_id)
                && chat.has_participant(other_id)
                && chat.item_id.as_deref() == item_id
        }) {
            return Ok(existing.clone());
        }

        let chat = Chat {
            id: format!("chat-{}", Uuid::new_v4()),
            participants: [user_id.to_string(), other_id.to_string()],
            last_message: String::new(),
            last_message_timestamp: Utc::now(),
            last_sender_id: None,
            unread_count: 0,
            item_id: item_id.map(str::to_string),
        };
        chats.push(chat.clone());
        write_list(&self.store, CHATS_KEY, &chats)?;
        info!("Opened chat {} between {} and {}", chat.id, user_id, other_id);
        Ok(chat)
    }

    pub fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        body: &str,
        item_id: Option<&str>,
    ) -> Result<ChatMessage> {
        self.send_message_at(chat_id, sender_id, body, item_id, Utc::now())
    }

    fn send_message_at(
        &self,
        chat_id: &str,
        sender_id: &str,
        body: &str,
        item_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage> {
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::Validation("Message cannot be empty".to_string()));
        }
        let mut chats = self.try_all_chats()?;
        let chat = chats
            .iter_mut()
            .find(|chat| chat.id == chat_id)
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))?;
        let receiver_id = other_participant(chat, sender_id)
            .filter(|_| chat.has_participant(sender_id))
            .ok_or_else(|| Error::NotParticipant {
                chat_id: chat_id.to_string(),
                user_id: sender_id.to_string(),
            })?
            .to_string();

        let message = ChatMessage {
            id: format!("msg-{}", Uuid::new_v4()),
            sender_id: sender_id.to_string(),
            receiver_id,
            message: body.to_string(),
            timestamp: now,
            item_id: item_id.map(str::to_string).or_else(|| chat.item_id.clone()),
        };

        let mut log: Vec<ChatMessage> = try_read_list(&self.store, &messages_key(chat_id))?;
        log.push(message.clone());
        write_list(&self.store, &messages_key(chat_id), &log)?;

        if chat.last_sender_id.as_deref() == Some(sender_id) {
            chat.unread_count += 1;
        } else {
            chat.unread_count = 1;
        }
        chat.last_sender_id = Some(sender_id.to_string());
        chat.last_message = message.message.clone();
        chat.last_message_timestamp = now;
        write_list(&self.store, CHATS_KEY, &chats)?;

        debug!("Appended {} to chat {}", message.id, chat_id);
        Ok(message)
    }

    pub fn mark_read(&self, chat_id: &str, reader_id: &str) -> Result<()> {
        let mut chats = self.try_all_chats()?;
        let chat = chats
            .iter_mut()
            .find(|chat| chat.id == chat_id)
            .ok_or_else(|| Error::ChatNotFound(chat_id.to_string()))?;
        if chat.unread_count == 0 || chat.last_sender_id.as_deref() == Some(reader_id) {
            return Ok(());
        }
        chat.unread_count = 0;
        write_list(&self.store, CHATS_KEY, &chats)
    }

    pub fn seed_demo(&self) -> Result<bool> {
        if self.store.get(CHATS_KEY)?.is_some() {
            return Ok(false);
        }
        write_list(&self.store, CHATS_KEY, &demo::chats())?;
        for (chat_id, messages) in demo::chat_messages() {
            write_list(&self.store, &messages_key(&chat_id), &messages)?;
        }
        info!("Seeded demo chats");
        Ok(true)
    }

    fn all_chats(&self) -> Vec<Chat> {
        read_list(&self.store, CHATS_KEY)
    }

    fn try_all_chats(&self) -> Result<Vec<Chat>> {
        try_read_list(&self.store, CHATS_KEY)
    }
}

pub fn other_participant<'a>(chat: &'a Chat, user_id: &str) -> Option<&'a str> {
    chat.participants
        .iter()
        .find(|p| p.as_str() != user_id)
        .map(String::as_str)
}

pub fn display_name(user_id: &str) -> String {
    format!("User {}", user_id.chars().take(4).collect::<String>())
}
