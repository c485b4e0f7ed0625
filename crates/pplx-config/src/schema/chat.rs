//! Request parameters and pre-request jitter.

use serde::{Deserialize, Serialize};

/// Service-specific request parameters embedded in every ask payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatParamsConfig {
    pub model: String,
    pub search_focus: String,
    /// Whether answers are augmented with web search.
    pub web_search: bool,
    pub language: String,
    pub mode: String,
    /// `intended_usage` value marking answer-text blocks in the stream.
    pub answer_usage: String,
}

impl Default for ChatParamsConfig {
    fn default() -> Self {
        Self {
            model: "turbo".into(),
            search_focus: "internet".into(),
            web_search: true,
            language: "en-US".into(),
            mode: "concise".into(),
            answer_usage: "ask_text".into(),
        }
    }
}

/// Bounded random delay applied before each ask request. `0`/`0` disables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub min_ms: u32,
    /// Valid range: `min_ms`-30000.
    pub max_ms: u32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            min_ms: 250,
            max_ms: 1500,
        }
    }
}

impl JitterConfig {
    pub fn disabled() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_ms == 0
    }
}
