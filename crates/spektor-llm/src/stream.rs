//! Incremental decoding of the model response stream

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::capture::SessionCapture;
use crate::error::LlmError;
use crate::thinking::ThinkingScanner;

/// One decoded piece of model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// Decoded text
    pub content: String,
    /// True when the text came from a thinking block
    pub thinking: bool,
}

/// One NDJSON line of the Ollama generate protocol
#[derive(Debug, Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, LlmError>> + Send>>;

/// Lazy, finite sequence of classified completion chunks
///
/// Produced once per request and consumed once. Dropping it at any point
/// drops the underlying connection, which closes it; stopping early never
/// errors. A transport failure is yielded as a single terminal error item.
pub struct CompletionStream {
    bytes: Option<ByteStream>,
    buf: Vec<u8>,
    scanner: ThinkingScanner,
    pending: VecDeque<StreamChunk>,
    capture: Option<SessionCapture>,
    final_line: Option<Value>,
}

impl CompletionStream {
    pub(crate) fn new(
        bytes: ByteStream,
        scanner: ThinkingScanner,
        capture: Option<SessionCapture>,
    ) -> Self {
        Self {
            bytes: Some(bytes),
            buf: Vec::new(),
            scanner,
            pending: VecDeque::new(),
            capture,
            final_line: None,
        }
    }

    /// Build a stream from raw NDJSON bytes
    ///
    /// Used by the client over `reqwest`'s byte stream and by tests over
    /// synthetic byte sequences.
    pub fn from_bytes<S>(bytes: S, scanner: ThinkingScanner, capture: Option<SessionCapture>) -> Self
    where
        S: Stream<Item = Result<Vec<u8>, LlmError>> + Send + 'static,
    {
        Self::new(Box::pin(bytes), scanner, capture)
    }

    /// Metadata from the server's terminating line, once the stream ended
    #[must_use]
    pub fn final_line(&self) -> Option<&Value> {
        self.final_line.as_ref()
    }

    /// Capture handle, for writing session metadata after consumption
    #[must_use]
    pub fn capture(&self) -> Option<&SessionCapture> {
        self.capture.as_ref()
    }

    /// Decode one complete NDJSON line
    ///
    /// Returns true when the line signalled end-of-stream. Unparseable
    /// lines are skipped.
    fn consume_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        if let Some(capture) = self.capture.as_mut() {
            capture.record_line(line);
        }
        let Ok(parsed) = serde_json::from_str::<GenerateLine>(line) else {
            debug!("skipping unparseable stream line");
            return false;
        };
        if parsed.done {
            self.final_line = serde_json::from_str(line).ok();
            return true;
        }
        if !parsed.response.is_empty() {
            self.pending.extend(self.scanner.push(&parsed.response));
        }
        false
    }

    /// Split buffered bytes into complete lines and decode them
    ///
    /// Returns true when a terminating line was seen.
    fn drain_buffer(&mut self) -> bool {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).into_owned();
            if self.consume_line(&line) {
                return true;
            }
        }
        false
    }

    /// End of input: flush the remaining partial line and the scanner
    fn finish(&mut self) {
        if !self.buf.is_empty() {
            let rest = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).into_owned();
            self.consume_line(&rest);
        }
        self.pending.extend(self.scanner.finish());
        self.bytes = None;
    }
}

impl Stream for CompletionStream {
    type Item = Result<StreamChunk, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }

            let Some(bytes) = this.bytes.as_mut() else {
                return Poll::Ready(None);
            };

            match bytes.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(data))) => {
                    this.buf.extend_from_slice(&data);
                    if this.drain_buffer() {
                        // Server signalled done; anything after is ignored
                        this.buf.clear();
                        this.finish();
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    // Terminal: already-yielded chunks stay valid, nothing
                    // more follows the error
                    this.bytes = None;
                    this.buf.clear();
                    this.pending.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finish();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn bytes_of(lines: &[&str]) -> Vec<Result<Vec<u8>, LlmError>> {
        lines
            .iter()
            .map(|l| Ok(format!("{l}\n").into_bytes()))
            .collect()
    }

    fn stream_of(lines: &[&str]) -> CompletionStream {
        CompletionStream::from_bytes(
            futures::stream::iter(bytes_of(lines)),
            ThinkingScanner::default(),
            None,
        )
    }

    #[tokio::test]
    async fn test_decodes_response_lines() {
        let mut stream = stream_of(&[
            r#"{"response":"hello "}"#,
            r#"{"response":"world"}"#,
            r#"{"done":true,"total_duration":1}"#,
        ]);

        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk.unwrap().content);
        }
        assert_eq!(text, "hello world");
        assert!(stream.final_line().is_some());
    }

    #[tokio::test]
    async fn test_classifies_thinking_content() {
        let mut stream = stream_of(&[
            r#"{"response":"<thinking>why</thinking>"}"#,
            r#"{"response":"answer"}"#,
            r#"{"done":true}"#,
        ]);

        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            chunks.push(chunk.unwrap());
        }
        assert!(chunks.iter().any(|c| c.thinking && c.content == "why"));
        let answer: String = chunks
            .iter()
            .filter(|c| !c.thinking)
            .map(|c| c.content.as_str())
            .collect();
        assert_eq!(answer, "answer");
    }

    #[tokio::test]
    async fn test_line_split_across_byte_chunks() {
        let pieces: Vec<Result<Vec<u8>, LlmError>> = vec![
            Ok(br#"{"response":"ab"#.to_vec()),
            Ok(b"c\"}\n".to_vec()),
            Ok(br#"{"done":true}"#.to_vec()),
        ];
        let mut stream = CompletionStream::from_bytes(
            futures::stream::iter(pieces),
            ThinkingScanner::default(),
            None,
        );

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.content, "abc");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_lines_are_skipped() {
        let mut stream = stream_of(&["garbage", r#"{"response":"ok"}"#, r#"{"done":true}"#]);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.content, "ok");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancellation_after_n_chunks_is_clean() {
        for n in 0..3 {
            let mut stream = stream_of(&[
                r#"{"response":"one"}"#,
                r#"{"response":"two"}"#,
                r#"{"response":"three"}"#,
                r#"{"done":true}"#,
            ]);
            for _ in 0..n {
                let _ = stream.next().await;
            }
            drop(stream);
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let pieces: Vec<Result<Vec<u8>, LlmError>> = vec![
            Ok(b"{\"response\":\"partial\"}\n".to_vec()),
            Err(LlmError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        ];
        let mut stream = CompletionStream::from_bytes(
            futures::stream::iter(pieces),
            ThinkingScanner::default(),
            None,
        );

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.content, "partial");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ends_without_done_line() {
        let mut stream = stream_of(&[r#"{"response":"tail"}"#]);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.content, "tail");
        assert!(stream.next().await.is_none());
        assert!(stream.final_line().is_none());
    }
}
