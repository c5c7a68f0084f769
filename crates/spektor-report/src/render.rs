//! Stream rendering

use std::io::Write;

use futures::StreamExt;
use spektor_llm::CompletionStream;
use tracing::debug;

use crate::error::ReportError;

/// Output of one rendered stream
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    /// Text written to the sink (thinking suppressed unless displayed)
    pub text: String,
    /// All decoded text in arrival order, thinking included
    pub raw_text: String,
}

/// Consume a completion stream, writing chunks to `out` as they arrive
///
/// Thinking-tagged chunks are withheld from `out` unless `show_thinking`;
/// they are always present in the returned `raw_text`.
///
/// # Errors
/// Propagates the stream's terminal transport error or a sink write error.
/// Output written before the failure stays written.
pub async fn render_stream(
    mut stream: CompletionStream,
    show_thinking: bool,
    out: &mut dyn Write,
) -> Result<Rendered, ReportError> {
    let mut rendered = Rendered::default();

    while let Some(item) = stream.next().await {
        let chunk = item?;
        rendered.raw_text.push_str(&chunk.content);
        if chunk.thinking && !show_thinking {
            continue;
        }
        out.write_all(chunk.content.as_bytes())?;
        out.flush()?;
        rendered.text.push_str(&chunk.content);
    }

    debug!(
        rendered_chars = rendered.text.len(),
        raw_chars = rendered.raw_text.len(),
        "stream rendered"
    );

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spektor_llm::{LlmError, ThinkingScanner};

    fn stream_of(lines: &[&str]) -> CompletionStream {
        let bytes: Vec<Result<Vec<u8>, LlmError>> = lines
            .iter()
            .map(|l| Ok(format!("{l}\n").into_bytes()))
            .collect();
        CompletionStream::from_bytes(
            futures::stream::iter(bytes),
            ThinkingScanner::default(),
            None,
        )
    }

    fn mixed_stream() -> CompletionStream {
        stream_of(&[
            r#"{"response":"visible "}"#,
            r#"{"response":"<thinking>secret reasoning</thinking>"}"#,
            r#"{"response":"answer"}"#,
            r#"{"done":true}"#,
        ])
    }

    #[tokio::test]
    async fn test_thinking_suppressed_by_default() {
        let mut out = Vec::new();
        let rendered = render_stream(mixed_stream(), false, &mut out).await.unwrap();

        let written = String::from_utf8(out).unwrap();
        assert_eq!(written, "visible answer");
        assert_eq!(rendered.text, "visible answer");
        assert!(!written.contains("secret"));
        // raw text keeps everything
        assert!(rendered.raw_text.contains("secret reasoning"));
    }

    #[tokio::test]
    async fn test_thinking_shown_when_enabled() {
        let mut out = Vec::new();
        let rendered = render_stream(mixed_stream(), true, &mut out).await.unwrap();

        assert!(rendered.text.contains("secret reasoning"));
        assert_eq!(String::from_utf8(out).unwrap(), rendered.text);
    }

    #[tokio::test]
    async fn test_error_preserves_prior_output() {
        let bytes: Vec<Result<Vec<u8>, LlmError>> = vec![
            Ok(b"{\"response\":\"partial \"}\n".to_vec()),
            Err(LlmError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            }),
        ];
        let stream = CompletionStream::from_bytes(
            futures::stream::iter(bytes),
            ThinkingScanner::default(),
            None,
        );

        let mut out = Vec::new();
        let err = render_stream(stream, false, &mut out).await.unwrap_err();

        assert!(matches!(err, ReportError::Llm(_)));
        assert_eq!(String::from_utf8(out).unwrap(), "partial ");
    }
}
