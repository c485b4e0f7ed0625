//! Event-stream decoding.
//!
//! `StreamParser` is a pure, incremental decoder: bytes in, answer tokens
//! out, with the terminal `ChatResponse` produced once the input ends.
//! `consume_stream` drives it from a live `ByteStream`.

mod driver;
mod parser;

#[cfg(test)]
mod tests;

pub use driver::consume_stream;
pub use parser::{StreamParser, DEFAULT_ANSWER_USAGE};
