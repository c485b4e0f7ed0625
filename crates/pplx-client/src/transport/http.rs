//! reqwest-backed `Transport`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use pplx_common::ChatError;
use pplx_config::schema::ServiceConfig;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    cancellable, Method, ResponseBody, ResponseMode, Transport, TransportRequest,
    TransportResponse,
};

struct Active {
    http: reqwest::Client,
    closed: CancellationToken,
}

/// Plain HTTPS transport. Built lazily by `initialize()`.
pub struct HttpTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
    active: Mutex<Option<Active>>,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(u64::from(config.connect_timeout_secs)),
            request_timeout: Duration::from_secs(u64::from(config.request_timeout_secs)),
            active: Mutex::new(None),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn initialize(&self) -> Result<(), ChatError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Ok(());
        }

        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.request_timeout)
            .build()
            .map_err(|e| ChatError::TransportInit(e.to_string()))?;

        *active = Some(Active {
            http,
            closed: CancellationToken::new(),
        });
        info!("HTTP transport initialized");
        Ok(())
    }

    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError> {
        let (http, closed) = {
            let active = self.active.lock().await;
            let active = active
                .as_ref()
                .ok_or_else(|| ChatError::TransportInit("transport not initialized".into()))?;
            (active.http.clone(), active.closed.clone())
        };

        let mut builder = match request.method {
            Method::Get => http.get(&request.url),
            Method::Post => http.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        // Streamed answers may run for minutes; they are bounded by the
        // per-read timeout only.
        if request.mode == ResponseMode::Buffered {
            builder = builder.timeout(self.request_timeout);
        }

        debug!(url = %request.url, mode = ?request.mode, "HTTP request");

        let response = builder
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = match request.mode {
            ResponseMode::Buffered => ResponseBody::Buffered(
                response
                    .bytes()
                    .await
                    .map_err(|e| ChatError::Network(e.to_string()))?,
            ),
            ResponseMode::Streamed => {
                let stream = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(|e| ChatError::Stream(e.to_string())));
                ResponseBody::Stream(cancellable(Box::pin(stream), closed, "transport closed"))
            }
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn shutdown(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.closed.cancel();
            info!("HTTP transport shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one chunked response whose parts arrive `gap` apart.
    async fn slow_chunked_server(parts: &'static [&'static str], gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\n\
                      transfer-encoding: chunked\r\n\r\n",
                )
                .await
                .unwrap();
            for part in parts {
                tokio::time::sleep(gap).await;
                let frame = format!("{:x}\r\n{part}\r\n", part.len());
                socket.write_all(frame.as_bytes()).await.unwrap();
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn streamed_body_may_outlast_request_timeout() {
        let parts = &["data: a\n", "data: b\n", "data: c\n"];
        let url = slow_chunked_server(parts, Duration::from_millis(600)).await;
        let config = ServiceConfig {
            request_timeout_secs: 1,
            ..Default::default()
        };
        let transport = HttpTransport::new(&config);
        transport.initialize().await.unwrap();

        let response = transport
            .request(TransportRequest::get(url).streamed())
            .await
            .unwrap();
        let mut body = Vec::new();
        let mut stream = response.into_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"data: a\ndata: b\ndata: c\n");
    }

    #[tokio::test]
    async fn request_before_initialize_fails() {
        let transport = HttpTransport::new(&ServiceConfig::default());
        let err = transport
            .request(TransportRequest::get("http://127.0.0.1:9/"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChatError::TransportInit(_)));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let transport = HttpTransport::new(&ServiceConfig::default());
        transport.initialize().await.unwrap();
        transport.initialize().await.unwrap();
        assert!(transport.is_initialized().await);
    }

    #[tokio::test]
    async fn shutdown_tolerates_missing_transport() {
        let transport = HttpTransport::new(&ServiceConfig::default());
        transport.shutdown().await;
        transport.initialize().await.unwrap();
        transport.shutdown().await;
        transport.shutdown().await;
        assert!(!transport.is_initialized().await);
    }
}
