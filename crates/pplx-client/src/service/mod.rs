//! `ChatService`: the facade callers drive.
//!
//! Owns conversation identity and message sequencing on top of
//! `ChatClient`, and republishes everything observable on the event bus.

mod guard;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pplx_common::{new_id, ChatError, Conversation, Event, EventBus, Message};
use pplx_config::PplxConfig;
use tokio::sync::broadcast;
use tracing::{info, warn};

use self::guard::{InFlight, InFlightGuard};
use crate::chat::ChatClient;
use crate::conversation::ConversationStore;
use crate::session::{SessionManager, SessionStore};
use crate::storage::KeyValueStore;
use crate::transport::Transport;

/// Identifies the exchange started by `ChatService::send_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub conversation_id: String,
    /// Id of the assistant message; every event of the exchange carries it.
    pub message_id: String,
}

pub struct ChatService {
    sessions: Arc<SessionManager>,
    client: ChatClient,
    conversations: ConversationStore,
    transport: Arc<dyn Transport>,
    events: EventBus,
    in_flight: InFlight,
    shut_down: AtomicBool,
}

impl ChatService {
    pub fn new(
        sessions: Arc<SessionManager>,
        client: ChatClient,
        conversations: ConversationStore,
        transport: Arc<dyn Transport>,
        events: EventBus,
    ) -> Self {
        Self {
            sessions,
            client,
            conversations,
            transport,
            events,
            in_flight: InFlight::default(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Wire every component from configuration over one transport and one
    /// storage backend.
    pub fn from_config(
        config: &PplxConfig,
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let events = EventBus::new(config.events.capacity as usize);
        let sessions = Arc::new(SessionManager::new(
            transport.clone(),
            SessionStore::new(storage.clone()),
            config.service.clone(),
            events.clone(),
        ));
        let client = ChatClient::new(
            transport.clone(),
            sessions.clone(),
            config.service.clone(),
            config.chat.clone(),
        )
        .with_jitter(config.jitter.clone());
        let conversations = ConversationStore::new(storage);
        Self::new(sessions, client, conversations, transport, events)
    }

    pub async fn initialize(&self) -> Result<(), ChatError> {
        self.sessions.initialize().await
    }

    /// Reuse a stored session or perform a fresh handshake.
    pub async fn authenticate(&self) -> bool {
        self.sessions.authenticate().await
    }

    /// Run a fresh handshake, replacing any stored session.
    pub async fn login(&self) -> bool {
        self.sessions.create_session().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated().await
    }

    pub async fn logout(&self) {
        self.sessions.invalidate().await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Send `content` in conversation `conversation_id`, or in a new one.
    ///
    /// The user message is committed before any network activity and stays
    /// even if the exchange fails. Tokens are published as `TokenReceived`
    /// in generation order, followed by exactly one `MessageCompleted` or
    /// `MessageFailed`.
    pub async fn send_message(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<SendReceipt, ChatError> {
        let conversation_id = match conversation_id {
            Some(id) => {
                if !self.conversations.contains(id).await {
                    return Err(ChatError::ConversationNotFound(id.to_string()));
                }
                id.to_string()
            }
            None => self.conversations.create(None).await.id,
        };

        let _guard = InFlightGuard::acquire(&self.in_flight, &conversation_id)?;

        self.conversations
            .append(&conversation_id, Message::user(content))
            .await?;

        let message_id = new_id();
        let on_token = {
            let events = self.events.clone();
            let message_id = message_id.clone();
            Box::new(move |token: String| {
                events.publish(Event::TokenReceived {
                    message_id: message_id.clone(),
                    token,
                });
            })
        };

        let outcome = match self.client.send_message(content, on_token).await {
            Ok(response) => self
                .conversations
                .append(
                    &conversation_id,
                    Message::assistant(message_id.clone(), response.clone()),
                )
                .await
                .map(|_| response),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => {
                info!(
                    conversation_id = %conversation_id,
                    message_id = %message_id,
                    "message completed"
                );
                self.events.publish(Event::MessageCompleted {
                    message_id: message_id.clone(),
                    response,
                });
                Ok(SendReceipt {
                    conversation_id,
                    message_id,
                })
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    message_id = %message_id,
                    "message failed: {e}"
                );
                self.events.publish(Event::MessageFailed {
                    message_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// All conversations, most recently active first.
    pub async fn get_conversations(&self) -> Vec<Conversation> {
        self.conversations.list().await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, ChatError> {
        self.conversations
            .get(id)
            .await
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))
    }

    pub async fn create_conversation(&self, title: Option<String>) -> Conversation {
        self.conversations.create(title).await
    }

    pub async fn delete_conversation(&self, id: &str) {
        self.conversations.delete(id).await;
    }

    pub async fn clear_conversations(&self) {
        self.conversations.clear().await;
    }

    /// Abort every exchange in flight; each fails with `Stream("cancelled")`.
    pub fn cancel(&self) {
        self.client.cancel();
    }

    /// Cancel in-flight work and release the transport. Only the first call
    /// reaches the transport.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.client.cancel();
        self.transport.shutdown().await;
        info!("chat service shut down");
    }
}
