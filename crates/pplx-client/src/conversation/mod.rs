//! In-memory conversation map mirrored to a `KeyValueStore`.
//!
//! Every mutation rewrites the full snapshot (a JSON object of id to
//! conversation) while the write lock is held, so stored state always
//! matches some in-memory state.

use std::collections::HashMap;
use std::sync::Arc;

use pplx_common::{ChatError, Conversation, Message};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::storage::{Durability, KeyValueStore, StorageScope};

const CONVERSATIONS_KEY: &str = "pplx.conversations";

pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl ConversationStore {
    /// Open the store, adopting whatever snapshot `storage` holds.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let conversations = load_snapshot(storage.as_ref());
        debug!(count = conversations.len(), "conversations loaded");
        Self {
            storage,
            conversations: RwLock::new(conversations),
        }
    }

    pub async fn create(&self, title: Option<String>) -> Conversation {
        let conversation = Conversation::new(title);
        let mut map = self.conversations.write().await;
        map.insert(conversation.id.clone(), conversation.clone());
        self.persist(&map);
        debug!(conversation_id = %conversation.id, "conversation created");
        conversation
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.conversations.read().await.contains_key(id)
    }

    /// All conversations, most recently updated first.
    pub async fn list(&self) -> Vec<Conversation> {
        let mut all: Vec<Conversation> =
            self.conversations.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        all
    }

    /// Append `message` to conversation `id` and return the updated record.
    pub async fn append(&self, id: &str, message: Message) -> Result<Conversation, ChatError> {
        let mut map = self.conversations.write().await;
        let conversation = map
            .get_mut(id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        conversation.push(message);
        let updated = conversation.clone();
        self.persist(&map);
        Ok(updated)
    }

    /// Remove `id`; absent ids are not an error.
    pub async fn delete(&self, id: &str) {
        let mut map = self.conversations.write().await;
        if map.remove(id).is_some() {
            debug!(conversation_id = %id, "conversation deleted");
        }
        self.persist(&map);
    }

    pub async fn clear(&self) {
        let mut map = self.conversations.write().await;
        map.clear();
        self.persist(&map);
        debug!("conversations cleared");
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    fn persist(&self, map: &HashMap<String, Conversation>) {
        let json = match serde_json::to_string(map) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize conversations: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set(
            CONVERSATIONS_KEY,
            &json,
            StorageScope::Application,
            Durability::Persistent,
        ) {
            warn!("failed to persist conversations: {e}");
        }
    }
}

fn load_snapshot(storage: &dyn KeyValueStore) -> HashMap<String, Conversation> {
    let Some(raw) = storage.get(CONVERSATIONS_KEY, StorageScope::Application) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("ignoring malformed stored conversations: {e}");
            HashMap::new()
        }
    }
}
