use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::types::ChatResponse;

/// Notifications published to subscribers of a chat service.
///
/// For a given `message_id`, every `TokenReceived` precedes the terminal
/// `MessageCompleted` or `MessageFailed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    TokenReceived {
        message_id: String,
        token: String,
    },
    MessageCompleted {
        message_id: String,
        response: ChatResponse,
    },
    MessageFailed {
        message_id: String,
        error: String,
    },
    AuthStatusChanged {
        is_authenticated: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish synchronously; returns the number of subscribers reached.
    pub fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(reached) => reached,
            Err(_) => {
                trace!("event dropped: no subscribers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
