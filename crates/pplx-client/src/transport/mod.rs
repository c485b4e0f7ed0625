//! HTTP transport contract.
//!
//! The core never talks to the network directly. It hands a
//! `TransportRequest` to whatever `Transport` it was constructed with and
//! gets back either a buffered body or a live byte stream.

mod http;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use pplx_common::ChatError;
use tokio_util::sync::CancellationToken;

pub use http::HttpTransport;

/// Live response body. Read errors surface as `ChatError::Stream`.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Buffered,
    Streamed,
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub mode: ResponseMode,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            mode: ResponseMode::Buffered,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            headers: Vec::new(),
            body: Some(body.into()),
            mode: ResponseMode::Buffered,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn streamed(mut self) -> Self {
        self.mode = ResponseMode::Streamed;
        self
    }

    /// First value of a request header, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub enum ResponseBody {
    Buffered(Bytes),
    Stream(ByteStream),
}

pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a (possibly repeated) header, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// View the body as a stream regardless of how it was received.
    pub fn into_stream(self) -> ByteStream {
        match self.body {
            ResponseBody::Stream(stream) => stream,
            ResponseBody::Buffered(bytes) => Box::pin(stream::once(async move { Ok(bytes) })),
        }
    }
}

/// Capability to perform HTTP requests.
///
/// Implementations decide how requests look on the wire (TLS stack,
/// fingerprinting, proxies); callers only rely on the status, headers and
/// body contract.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Idempotent setup. Fails with `ChatError::TransportInit`.
    async fn initialize(&self) -> Result<(), ChatError>;

    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError>;

    /// Release the underlying resources. Pending stream reads fail with
    /// `ChatError::Stream`. Safe to call repeatedly or before `initialize`.
    async fn shutdown(&self);
}

/// Wrap a byte stream so that cancelling `token` makes the next (or
/// pending) read yield `ChatError::Stream(reason)` and end the stream.
pub fn cancellable(
    inner: ByteStream,
    token: CancellationToken,
    reason: &'static str,
) -> ByteStream {
    Box::pin(stream::unfold(Some((inner, token)), move |state| async move {
        let (mut inner, token) = state?;
        let next = tokio::select! {
            _ = token.cancelled() => None,
            item = inner.next() => Some(item),
        };
        match next {
            None => Some((Err(ChatError::Stream(reason.to_string())), None)),
            Some(Some(item)) => Some((item, Some((inner, token)))),
            Some(None) => None,
        }
    }))
}
