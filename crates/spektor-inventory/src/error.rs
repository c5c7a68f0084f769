//! Error types for spektor-inventory

use thiserror::Error;

/// Errors from loading or saving inventory documents
///
/// These are the only fatal errors the crate produces: probe failures are
/// recovered into validation issues by the collector and never propagate.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not a valid inventory document
    #[error("document format error: {0}")]
    Format(String),
}
