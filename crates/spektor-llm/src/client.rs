//! Ollama HTTP client

use chrono::Utc;
use futures::StreamExt;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::capture::SessionCapture;
use crate::error::LlmError;
use crate::stream::CompletionStream;
use crate::thinking::{ThinkingMatcher, ThinkingScanner};

/// Default Ollama endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model name
pub const DEFAULT_MODEL: &str = "gemma3:12b";

/// Options for one completion request
#[derive(Default)]
pub struct GenerateOptions {
    /// System prompt text
    pub system: String,
    /// Raw-chunk capture sink, when enabled
    pub capture: Option<SessionCapture>,
    /// Thinking delimiter matcher; default tag matcher when unset
    pub matcher: Option<Box<dyn ThinkingMatcher>>,
}

/// Streaming client for a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
}

impl OllamaClient {
    /// Create a client for a server URL and model name
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Result<Self, LlmError> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            model: model.into(),
        })
    }

    /// Model this client generates with
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Open one streaming completion request
    ///
    /// The returned stream is finite and non-restartable; dropping it closes
    /// the connection. There is no retry: a failed request must be re-issued
    /// by the caller.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the server answers with a
    /// non-success status.
    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    pub async fn stream_generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<CompletionStream, LlmError> {
        let url = self.base_url.join("/api/generate")?;
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "system": options.system,
            "stream": true,
        });

        debug!(url = %url, prompt_chars = prompt.len(), "opening completion stream");
        let started_at = Utc::now();

        let response = self.http.post(url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if let Some(capture) = options.capture.as_ref() {
            capture.write_meta(&json!({
                "model": self.model,
                "http_status": status.as_u16(),
                "started_at": started_at.to_rfc3339(),
                "prompt_chars": prompt.len(),
                "system_chars": options.system.len(),
            }));
        }

        let scanner = ThinkingScanner::new(
            options
                .matcher
                .unwrap_or_else(|| Box::new(crate::thinking::TagMatcher::default())),
        );

        let bytes = response
            .bytes_stream()
            .map(|item| item.map(|b| b.to_vec()).map_err(LlmError::Http));

        Ok(CompletionStream::from_bytes(bytes, scanner, options.capture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        assert!(OllamaClient::new("not a url", DEFAULT_MODEL).is_err());
    }

    #[test]
    fn test_defaults() {
        let client = OllamaClient::new(DEFAULT_BASE_URL, DEFAULT_MODEL).unwrap();
        assert_eq!(client.model(), "gemma3:12b");
    }
}
