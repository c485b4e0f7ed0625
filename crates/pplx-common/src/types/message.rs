use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::new_id;

/// Terminal result of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
    pub thread_url_slug: String,
    pub read_write_token: String,
    /// Answer length in characters.
    pub full_response_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChatResponse>,
}

impl Message {
    /// A user-authored message with a fresh id.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            timestamp: Utc::now(),
            is_user: true,
            response: None,
        }
    }

    /// An assistant message carrying the finished exchange.
    ///
    /// The id is supplied by the caller so that tokens published during
    /// streaming and the stored message share it.
    pub fn assistant(id: impl Into<String>, response: ChatResponse) -> Self {
        Self {
            id: id.into(),
            content: response.answer.clone(),
            timestamp: Utc::now(),
            is_user: false,
            response: Some(response),
        }
    }
}
