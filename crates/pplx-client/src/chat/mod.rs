//! One streamed request/response exchange against the ask endpoint.
//!
//! `ChatClient` commits nothing: conversation bookkeeping is the caller's
//! job. It only turns a question into tokens and a final `ChatResponse`.

mod payload;

use std::sync::Arc;

use parking_lot::Mutex;
use pplx_common::{new_correlation_id, ChatError, ChatResponse};
use pplx_config::schema::{ChatParamsConfig, JitterConfig, ServiceConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::SessionManager;
use crate::streaming::{consume_stream, StreamParser};
use crate::transport::Transport;

/// Receives answer tokens as they are decoded.
pub type TokenCallback = Box<dyn Fn(String) + Send + Sync>;

pub struct ChatClient {
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionManager>,
    service: ServiceConfig,
    params: ChatParamsConfig,
    jitter: JitterConfig,
    /// Shared by every exchange started since the last `cancel()`.
    cancel: Mutex<CancellationToken>,
}

impl ChatClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionManager>,
        service: ServiceConfig,
        params: ChatParamsConfig,
    ) -> Self {
        Self {
            transport,
            sessions,
            service,
            params,
            jitter: JitterConfig::default(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_jitter(mut self, jitter: JitterConfig) -> Self {
        self.jitter = jitter;
        self
    }

    /// Ask `content` and stream the answer.
    ///
    /// `on_token` runs zero or more times, in generation order, before the
    /// returned response resolves. Fails with `NotAuthenticated` before any
    /// network activity when no session is active.
    pub async fn send_message(
        &self,
        content: &str,
        on_token: TokenCallback,
    ) -> Result<ChatResponse, ChatError> {
        let session = self
            .sessions
            .active_session()
            .await
            .ok_or(ChatError::NotAuthenticated)?;

        let cancel = self.cancel.lock().clone();
        let exchange = new_correlation_id();

        let delay = payload::jitter_delay(&self.jitter);
        if !delay.is_zero() {
            debug!(exchange = %exchange, delay_ms = delay.as_millis() as u64, "pre-request delay");
            tokio::select! {
                _ = cancel.cancelled() => return Err(ChatError::Stream("cancelled".into())),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let request = payload::build_request(content, &session, &self.service, &self.params);
        info!(exchange = %exchange, model = %self.params.model, "ask request");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ChatError::Stream("cancelled".into())),
            response = self.transport.request(request) => response?,
        };

        if !response.is_success() {
            warn!(exchange = %exchange, status = response.status, "ask request rejected");
            return Err(ChatError::RequestFailed {
                status: response.status,
            });
        }

        let parser = StreamParser::with_answer_usage(self.params.answer_usage.as_str());
        let result = consume_stream(response.into_stream(), parser, &*on_token, &cancel).await;
        match &result {
            Ok(answer) => info!(
                exchange = %exchange,
                length = answer.full_response_length,
                "ask completed"
            ),
            Err(e) => warn!(exchange = %exchange, "ask aborted: {e}"),
        }
        result
    }

    /// Abort every exchange currently in flight. Later exchanges are
    /// unaffected.
    pub fn cancel(&self) {
        let mut token = self.cancel.lock();
        token.cancel();
        *token = CancellationToken::new();
    }
}
