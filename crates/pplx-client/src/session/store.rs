//! Persisted session record.

use std::sync::Arc;

use pplx_common::Session;
use tracing::{debug, warn};

use crate::storage::{Durability, KeyValueStore, StorageScope};

const SESSION_KEY: &str = "pplx.session";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Read the stored session. Malformed data counts as nothing stored.
    pub fn load(&self) -> Option<Session> {
        let raw = self.storage.get(SESSION_KEY, StorageScope::Application)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("ignoring malformed stored session: {e}");
                None
            }
        }
    }

    /// Best-effort save; failures are logged.
    pub fn save(&self, session: &Session) {
        let json = match serde_json::to_string(session) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize session: {e}");
                return;
            }
        };
        match self.storage.set(
            SESSION_KEY,
            &json,
            StorageScope::Application,
            Durability::Persistent,
        ) {
            Ok(()) => debug!(session_id = %session.session_id, "session saved"),
            Err(e) => warn!("failed to save session: {e}"),
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(SESSION_KEY, StorageScope::Application) {
            warn!("failed to remove stored session: {e}");
        }
    }
}
