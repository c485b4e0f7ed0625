use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream;
use parking_lot::Mutex;
use pplx_common::{ChatError, ChatResponse};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::testing::sse_body;
use crate::transport::ByteStream;

fn run(mut p: StreamParser, chunks: &[&[u8]]) -> (Vec<String>, ChatResponse) {
    let mut tokens = Vec::new();
    for chunk in chunks {
        tokens.extend(p.feed(chunk));
    }
    let (rest, response) = p.finish();
    tokens.extend(rest);
    (tokens, response)
}

fn parse_all(chunks: &[&[u8]]) -> (Vec<String>, ChatResponse) {
    run(StreamParser::new(), chunks)
}

fn answer_doc(chunks: &[&str]) -> String {
    json!({
        "blocks": [{
            "intended_usage": "ask_text",
            "markdown_block": { "chunks": chunks }
        }]
    })
    .to_string()
}

fn snapshot_doc(answer: &str) -> String {
    json!({
        "blocks": [{
            "intended_usage": "ask_text",
            "markdown_block": { "answer": answer }
        }]
    })
    .to_string()
}

#[test]
fn chunks_are_emitted_verbatim() {
    let body = sse_body(&["He", "llo"]);
    let (tokens, response) = parse_all(&[body.as_bytes()]);

    assert_eq!(tokens, vec!["He", "llo"]);
    assert_eq!(response.answer, "Hello");
    assert_eq!(response.full_response_length, 5);
    assert_eq!(response.thread_url_slug, "thread-1");
    assert_eq!(response.read_write_token, "rw-1");
    assert!(response.success);
}

#[test]
fn rechunking_does_not_change_output() {
    let mut body = String::new();
    body.push_str("event: message\n");
    body.push_str(&format!("data: {}\n\n", answer_doc(&["Zürich ", "is "])));
    body.push_str(&format!("data: {}\n", snapshot_doc("Zürich is in 🇨🇭.")));
    body.push_str("data: {not json\n");
    body.push_str("event: end_of_stream\n");
    body.push_str("data: {\"thread_url_slug\":\"slug-9\"}\n");

    let bytes = body.as_bytes();
    let expected = parse_all(&[bytes]);
    assert_eq!(expected.1.answer, "Zürich is in 🇨🇭.");

    for size in 1..=bytes.len() {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        assert_eq!(parse_all(&chunks), expected, "chunk size {size}");
    }

    // Irregular split points, including inside multi-byte characters.
    let mut chunks: Vec<&[u8]> = Vec::new();
    let mut rest = bytes;
    let mut step = 1;
    while !rest.is_empty() {
        let n = step.min(rest.len());
        let (head, tail) = rest.split_at(n);
        chunks.push(head);
        rest = tail;
        step = step % 7 + 2;
    }
    assert_eq!(parse_all(&chunks), expected);
}

#[test]
fn cumulative_answer_emits_only_the_suffix() {
    let mut body = String::new();
    body.push_str(&format!("data: {}\n", answer_doc(&["Hel"])));
    body.push_str(&format!("data: {}\n", snapshot_doc("Hello")));
    body.push_str(&format!("data: {}\n", snapshot_doc("Hello")));
    body.push_str(&format!("data: {}\n", snapshot_doc("Hello, world")));

    let (tokens, response) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["Hel", "lo", ", world"]);
    assert_eq!(response.answer, "Hello, world");
}

#[test]
fn malformed_line_is_skipped() {
    let mut body = String::new();
    body.push_str(&format!("data: {}\n", answer_doc(&["a"])));
    body.push_str("data: {\"blocks\": [\n");
    body.push_str(&format!("data: {}\n", answer_doc(&["b"])));

    let (tokens, response) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["a", "b"]);
    assert_eq!(response.answer, "ab");
}

#[test]
fn non_message_events_skip_content_but_keep_metadata() {
    let gated = json!({
        "thread_url_slug": "slug-2",
        "read_write_token": "rw-2",
        "blocks": [{
            "intended_usage": "ask_text",
            "markdown_block": { "chunks": ["hidden"] }
        }]
    });
    let mut body = String::new();
    body.push_str("event: message\n");
    body.push_str(&format!("data: {}\n", answer_doc(&["shown"])));
    body.push_str("event: telemetry\n");
    body.push_str(&format!("data: {gated}\n"));

    let (tokens, response) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["shown"]);
    assert_eq!(response.thread_url_slug, "slug-2");
    assert_eq!(response.read_write_token, "rw-2");
}

#[test]
fn content_before_any_event_line_is_accepted() {
    let body = format!("data: {}\n", answer_doc(&["no event"]));
    let (tokens, _) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["no event"]);
}

#[test]
fn other_block_usages_are_ignored() {
    let doc = json!({
        "blocks": [
            { "intended_usage": "sources_answer_mode", "markdown_block": { "chunks": ["x"] } },
            { "intended_usage": "ask_text", "markdown_block": { "chunks": ["y"] } }
        ]
    });
    let body = format!("data: {doc}\n");
    let (tokens, _) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["y"]);
}

#[test]
fn custom_answer_usage_marker() {
    let doc = json!({
        "blocks": [{ "intended_usage": "answer", "markdown_block": { "chunks": ["z"] } }]
    });
    let body = format!("data: {doc}\n");
    let (tokens, _) = run(StreamParser::with_answer_usage("answer"), &[body.as_bytes()]);
    assert_eq!(tokens, vec!["z"]);
}

#[test]
fn empty_object_blank_lines_and_crlf_are_tolerated() {
    let body = format!(
        "\r\n\r\nevent: message\r\ndata: {{}}\r\n\r\ndata: {}\r\n",
        answer_doc(&["ok"])
    );
    let (tokens, response) = parse_all(&[body.as_bytes()]);
    assert_eq!(tokens, vec!["ok"]);
    assert_eq!(response.answer, "ok");
}

#[test]
fn unterminated_final_line_is_processed_on_finish() {
    let body = format!("data: {}", answer_doc(&["tail"]));
    let mut parser = StreamParser::new();
    assert!(parser.feed(body.as_bytes()).is_empty());
    let (tokens, response) = parser.finish();
    assert_eq!(tokens, vec!["tail"]);
    assert_eq!(response.answer, "tail");
}

#[test]
fn long_line_fed_bytewise_is_reassembled() {
    let answer: String = "Grüße aus Zürich. ".repeat(2_000);
    let body = format!(
        "data: {}\ndata: {}\n",
        answer_doc(&[answer.as_str()]),
        answer_doc(&["!"])
    );

    let mut parser = StreamParser::new();
    let mut tokens = Vec::new();
    for byte in body.as_bytes() {
        tokens.extend(parser.feed(std::slice::from_ref(byte)));
    }
    let (rest, response) = parser.finish();

    assert!(rest.is_empty());
    assert_eq!(tokens, vec![answer.clone(), "!".to_string()]);
    assert_eq!(response.answer, format!("{answer}!"));
    assert_eq!(response.full_response_length, answer.chars().count() + 1);
}

#[test]
fn empty_stream_yields_empty_successful_response() {
    let (tokens, response) = parse_all(&[]);
    assert!(tokens.is_empty());
    assert_eq!(response.answer, "");
    assert_eq!(response.full_response_length, 0);
    assert!(response.success);
}

fn collector() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |token: String| sink.lock().push(token))
}

#[tokio::test]
async fn consume_stream_forwards_tokens_live() {
    let body = sse_body(&["He", "llo"]);
    let (first, second) = body.as_bytes().split_at(body.len() / 2);
    let byte_stream: ByteStream = Box::pin(stream::iter(vec![
        Ok(Bytes::copy_from_slice(first)),
        Ok(Bytes::copy_from_slice(second)),
    ]));

    let (seen, on_token) = collector();
    let response = consume_stream(
        byte_stream,
        StreamParser::new(),
        &on_token,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock(), vec!["He", "llo"]);
    assert_eq!(response.answer, "Hello");
}

#[tokio::test]
async fn consume_stream_surfaces_transport_fault() {
    let first = format!("data: {}\n", answer_doc(&["partial"]));
    let byte_stream: ByteStream = Box::pin(stream::iter(vec![
        Ok(Bytes::from(first)),
        Err(ChatError::Stream("connection reset".into())),
    ]));

    let (seen, on_token) = collector();
    let err = consume_stream(
        byte_stream,
        StreamParser::new(),
        &on_token,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err, ChatError::Stream("connection reset".into()));
    assert_eq!(*seen.lock(), vec!["partial"]);
}

#[tokio::test]
async fn consume_stream_is_cancellable() {
    let byte_stream: ByteStream = Box::pin(stream::pending());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let task = tokio::spawn(async move {
        consume_stream(byte_stream, StreamParser::new(), &|_token: String| {}, &cancel).await
    });
    trigger.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert_eq!(err, ChatError::Stream("cancelled".into()));
}
