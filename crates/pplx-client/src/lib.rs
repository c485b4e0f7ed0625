//! Streaming chat client core.
//!
//! Provides:
//! - A transport contract with a reqwest-backed implementation
//! - Session lifecycle (handshake, persistence, invalidation)
//! - An incremental event-stream parser producing answer tokens
//! - A chat client running one streamed exchange
//! - A persisted conversation store and the `ChatService` facade

pub mod chat;
pub mod conversation;
pub mod service;
pub mod session;
pub mod storage;
pub mod streaming;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatClient, TokenCallback};
pub use conversation::ConversationStore;
pub use service::{ChatService, SendReceipt};
pub use session::{AuthState, SessionManager, SessionStore};
pub use storage::{Durability, FileStore, KeyValueStore, MemoryStore, StorageScope};
pub use streaming::StreamParser;
pub use transport::{
    HttpTransport, Method, ResponseBody, ResponseMode, Transport, TransportRequest,
    TransportResponse,
};

pub use pplx_common::{ChatError, ChatResponse, Conversation, Event, Message, Session};
