use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by the session, client and conversation layers.
///
/// Authentication failure is deliberately absent: a failed handshake is a
/// normal `false` return, not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("transport init error: {0}")]
    TransportInit(String),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("request failed with HTTP {status}")]
    RequestFailed { status: u16 },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("conversation busy: {0}")]
    ConversationBusy(String),
}
