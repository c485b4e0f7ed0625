//! Incremental `event:`/`data:` line decoder.

use pplx_common::ChatResponse;
use serde_json::Value;
use tracing::debug;

/// `intended_usage` of blocks carrying answer text.
pub const DEFAULT_ANSWER_USAGE: &str = "ask_text";

/// The only event name whose documents contribute answer text.
const MESSAGE_EVENT: &str = "message";

pub struct StreamParser {
    answer_usage: String,
    /// Bytes of an incomplete trailing line.
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    current_event: Option<String>,
    answer: String,
    answer_chars: usize,
    thread_url_slug: String,
    read_write_token: String,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::with_answer_usage(DEFAULT_ANSWER_USAGE)
    }

    pub fn with_answer_usage(answer_usage: impl Into<String>) -> Self {
        Self {
            answer_usage: answer_usage.into(),
            pending: Vec::new(),
            scanned: 0,
            current_event: None,
            answer: String::new(),
            answer_chars: 0,
            thread_url_slug: String::new(),
            read_write_token: String::new(),
        }
    }

    /// Feed one chunk; returns the tokens completed by it, in order.
    ///
    /// Chunks need not align with lines, frames or UTF-8 sequences.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut tokens = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            let line = String::from_utf8_lossy(&self.pending[start..end]).into_owned();
            self.process_line(&line, &mut tokens);
            start = end + 1;
            search_from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        tokens
    }

    /// Flush an unterminated final line and produce the terminal response.
    pub fn finish(mut self) -> (Vec<String>, ChatResponse) {
        let mut tokens = Vec::new();
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.scanned = 0;
            self.process_line(&line, &mut tokens);
        }

        let response = ChatResponse {
            success: true,
            full_response_length: self.answer_chars,
            answer: self.answer,
            thread_url_slug: self.thread_url_slug,
            read_write_token: self.read_write_token,
        };
        (tokens, response)
    }

    fn process_line(&mut self, line: &str, tokens: &mut Vec<String>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return;
        }

        if let Some(name) = line.strip_prefix("event:") {
            self.current_event = Some(name.trim().to_string());
            return;
        }

        let Some(payload) = line.strip_prefix("data:") else {
            return;
        };
        let payload = payload.trim();
        if payload == "{}" {
            return;
        }

        let doc: Value = match serde_json::from_str(payload) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("skipping malformed data line: {e}");
                return;
            }
        };

        self.read_metadata(&doc);

        let gated = matches!(&self.current_event, Some(name) if name != MESSAGE_EVENT);
        if !gated {
            self.extract_content(&doc, tokens);
        }
    }

    fn read_metadata(&mut self, doc: &Value) {
        if let Some(slug) = doc.get("thread_url_slug").and_then(Value::as_str) {
            self.thread_url_slug = slug.to_string();
        }
        if let Some(token) = doc.get("read_write_token").and_then(Value::as_str) {
            self.read_write_token = token.to_string();
        }
    }

    fn extract_content(&mut self, doc: &Value, tokens: &mut Vec<String>) {
        let Some(blocks) = doc.get("blocks").and_then(Value::as_array) else {
            return;
        };

        for block in blocks {
            let usage = block.get("intended_usage").and_then(Value::as_str);
            if usage != Some(self.answer_usage.as_str()) {
                continue;
            }
            let Some(markdown) = block.get("markdown_block") else {
                continue;
            };

            if let Some(chunks) = markdown.get("chunks").and_then(Value::as_array) {
                for chunk in chunks.iter().filter_map(Value::as_str) {
                    self.emit(chunk.to_string(), tokens);
                }
            } else if let Some(full) = markdown.get("answer").and_then(Value::as_str) {
                let suffix: String = full.chars().skip(self.answer_chars).collect();
                self.emit(suffix, tokens);
            }
        }
    }

    fn emit(&mut self, token: String, tokens: &mut Vec<String>) {
        if token.is_empty() {
            return;
        }
        self.answer_chars += token.chars().count();
        self.answer.push_str(&token);
        tokens.push(token);
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
