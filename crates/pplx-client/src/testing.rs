//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use parking_lot::Mutex;
use pplx_common::ChatError;
use tokio_util::sync::CancellationToken;

use crate::transport::{
    cancellable, ByteStream, ResponseBody, Transport, TransportRequest, TransportResponse,
};

pub(crate) enum Scripted {
    Buffered {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    /// Streamed body; with `hang` the stream stays open after the chunks.
    Stream {
        status: u16,
        chunks: Vec<Result<Vec<u8>, ChatError>>,
        hang: bool,
    },
    Fail(ChatError),
}

impl Scripted {
    pub(crate) fn handshake_ok() -> Self {
        Scripted::Buffered {
            status: 200,
            headers: vec![
                ("set-cookie".into(), "sid=abc; Path=/; HttpOnly".into()),
                ("set-cookie".into(), "csrf=xyz; Path=/".into()),
            ],
            body: "<html></html>".into(),
        }
    }

    pub(crate) fn sse(chunks: &[&str]) -> Self {
        Scripted::Stream {
            status: 200,
            chunks: chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect(),
            hang: false,
        }
    }
}

/// Build an event-stream body whose `message` events carry `chunks`.
pub(crate) fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        let doc = serde_json::json!({
            "thread_url_slug": "thread-1",
            "read_write_token": "rw-1",
            "blocks": [{
                "intended_usage": "ask_text",
                "markdown_block": { "chunks": [chunk] }
            }]
        });
        body.push_str("event: message\n");
        body.push_str(&format!("data: {doc}\n\n"));
    }
    body.push_str("event: end_of_stream\ndata: {}\n\n");
    body
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
    init_error: Option<String>,
    initializations: AtomicUsize,
    shutdowns: AtomicUsize,
    closed: CancellationToken,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub(crate) fn failing_init(reason: &str) -> Self {
        Self {
            init_error: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn push(&self, response: Scripted) {
        self.responses.lock().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn initialize(&self) -> Result<(), ChatError> {
        if let Some(reason) = &self.init_error {
            return Err(ChatError::TransportInit(reason.clone()));
        }
        self.initializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError> {
        self.requests.lock().push(request);
        let next = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Scripted::Fail(ChatError::Network("no scripted response".into())));

        match next {
            Scripted::Buffered {
                status,
                headers,
                body,
            } => Ok(TransportResponse {
                status,
                headers,
                body: ResponseBody::Buffered(Bytes::from(body)),
            }),
            Scripted::Stream {
                status,
                chunks,
                hang,
            } => {
                let items = stream::iter(
                    chunks
                        .into_iter()
                        .map(|chunk| chunk.map(Bytes::from))
                        .collect::<Vec<_>>(),
                );
                let inner: ByteStream = if hang {
                    Box::pin(futures_util::StreamExt::chain(items, stream::pending()))
                } else {
                    Box::pin(items)
                };
                Ok(TransportResponse {
                    status,
                    headers: Vec::new(),
                    body: ResponseBody::Stream(cancellable(
                        inner,
                        self.closed.clone(),
                        "transport closed",
                    )),
                })
            }
            Scripted::Fail(err) => Err(err),
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.closed.cancel();
    }
}
