//! spektor-llm: Streaming Ollama client
//!
//! One streaming HTTP request per completion, decoded incrementally into
//! chunks tagged as thinking or answer content. Dropping the stream closes
//! the connection.

pub mod capture;
pub mod client;
pub mod error;
pub mod stream;
pub mod thinking;

pub use capture::SessionCapture;
pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GenerateOptions, OllamaClient};
pub use error::LlmError;
pub use stream::{CompletionStream, StreamChunk};
pub use thinking::{TagMatcher, ThinkingMatcher, ThinkingScanner};
