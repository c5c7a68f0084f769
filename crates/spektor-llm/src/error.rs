//! Error types for the model client

use thiserror::Error;

/// Errors that can occur when talking to the model server
///
/// A failure surfaces once, as the terminal item of the completion stream;
/// chunks already yielded stay valid.
#[derive(Error, Debug)]
pub enum LlmError {
    /// HTTP request or transport failure
    #[error("model transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid server URL
    #[error("invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    /// Server returned a non-success status
    #[error("model server error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        message: String,
    },

    /// Capture file could not be written
    #[error("capture I/O error: {0}")]
    Capture(#[from] std::io::Error),
}
