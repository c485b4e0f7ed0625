//! Data model shared by the client crate, the config crate and the binary.
//!
//! Everything here is plain serde data; behaviour lives in `pplx-client`.

mod conversation;
mod message;
mod session;

pub use conversation::{title_from, Conversation, DEFAULT_CONVERSATION_TITLE, TITLE_MAX_CHARS};
pub use message::{ChatResponse, Message};
pub use session::Session;
