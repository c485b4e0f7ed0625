pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ChatError, ConfigError, StorageError};
pub use events::{Event, EventBus};
pub use id::{new_correlation_id, new_id};
pub use types::{ChatResponse, Conversation, Message, Session, DEFAULT_CONVERSATION_TITLE};

pub type Result<T> = std::result::Result<T, ChatError>;
