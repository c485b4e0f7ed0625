use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::id::new_id;

/// Title given to conversations until their first exchange completes.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Titles derived from the first user message are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// An ordered thread of user/assistant messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message, bump `updated_at` and apply the first-exchange
    /// title rule.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }

        if self.messages.len() == 2 && self.title == DEFAULT_CONVERSATION_TITLE {
            if let Some(first) = self.messages.iter().find(|m| m.is_user) {
                self.title = title_from(&first.content);
            }
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Derive a conversation title from user text.
pub fn title_from(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        content.to_string()
    }
}
