//! Service endpoint and HTTP client settings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Where the service lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Entry page; the handshake is a GET against this URL.
    pub base_url: String,
    /// Path of the streaming ask endpoint, joined onto `base_url`.
    pub ask_path: String,
    pub user_agent: String,
    /// Valid range: 1-60.
    pub connect_timeout_secs: u32,
    /// Whole-request cap for buffered requests; for streamed answers, the
    /// longest allowed gap between chunks. Valid range: 10-600.
    pub request_timeout_secs: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.perplexity.ai".into(),
            ask_path: "/rest/sse/perplexity_ask".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    /// Full URL of the ask endpoint.
    pub fn ask_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.ask_path.trim_start_matches('/')
        )
    }
}
