//! Drive a `StreamParser` from a live byte stream.

use futures_util::StreamExt;
use pplx_common::{ChatError, ChatResponse};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::parser::StreamParser;
use crate::transport::ByteStream;

/// Read `stream` to the end, invoking `on_token` for every token in
/// generation order, and return the terminal response.
///
/// A read error or cancellation aborts with `ChatError::Stream`; tokens
/// already delivered are not retracted.
pub async fn consume_stream(
    mut stream: ByteStream,
    mut parser: StreamParser,
    on_token: &(dyn Fn(String) + Send + Sync),
    cancel: &CancellationToken,
) -> Result<ChatResponse, ChatError> {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ChatError::Stream("cancelled".into()));
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for token in parser.feed(&chunk) {
                    on_token(token);
                }
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    let (tokens, response) = parser.finish();
    for token in tokens {
        on_token(token);
    }
    debug!(length = response.full_response_length, "stream finished");
    Ok(response)
}
