//! Error types for spektor-report

use thiserror::Error;

/// Errors that can occur while composing or rendering a report
#[derive(Error, Debug)]
pub enum ReportError {
    /// Requested section is not in the document
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// Model client failure
    #[error(transparent)]
    Llm(#[from] spektor_llm::LlmError),

    /// Capture or output write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
