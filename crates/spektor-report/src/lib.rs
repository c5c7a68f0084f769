//! spektor-report: LLM-backed reporting over inventory documents
//!
//! Builds prompts from a loaded document, streams the model's answer, and
//! renders it with optional thinking display and raw capture.

pub mod error;
pub mod prompt;
pub mod render;

use std::io::Write;
use std::path::PathBuf;

use spektor_inventory::InventoryDocument;
use spektor_llm::capture::{self, SessionCapture};
use spektor_llm::{GenerateOptions, OllamaClient};
use tracing::{info, instrument};

pub use error::ReportError;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, ReportTarget, build_prompt, resolve_system_prompt};
pub use render::{Rendered, render_stream};

/// Default directory for capture artifacts
pub const DEFAULT_DEBUG_DIR: &str = "debug";

/// Display and capture settings for one report
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Render thinking content instead of suppressing it
    pub show_thinking: bool,
    /// Persist the full raw text (thinking included) regardless of display
    pub save_thinking: bool,
    /// Log raw streamed chunks and session metadata
    pub debug_capture: bool,
    /// Directory for capture artifacts
    pub debug_dir: PathBuf,
    /// System prompt: file path if one exists, else literal text
    pub system_prompt: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            show_thinking: false,
            save_thinking: false,
            debug_capture: false,
            debug_dir: PathBuf::from(DEFAULT_DEBUG_DIR),
            system_prompt: None,
        }
    }
}

/// Compose a prompt for `target`, stream the model's answer to `out`, and
/// return the rendered text
///
/// # Errors
/// Fails on an unknown section name, a transport error, or an unwritable
/// capture path. Output already rendered to `out` is preserved on error.
#[instrument(skip(client, doc, options, out))]
pub async fn report(
    client: &OllamaClient,
    doc: &InventoryDocument,
    target: &ReportTarget,
    options: &ReportOptions,
    out: &mut dyn Write,
) -> Result<String, ReportError> {
    let (task, prompt) = build_prompt(doc, target)?;
    let system = resolve_system_prompt(options.system_prompt.as_deref());

    let session_capture = if options.debug_capture {
        Some(SessionCapture::new(&options.debug_dir)?)
    } else {
        None
    };

    info!(task, prompt_chars = prompt.len(), "requesting report");

    let stream = client
        .stream_generate(
            &prompt,
            GenerateOptions {
                system,
                capture: session_capture,
                matcher: None,
            },
        )
        .await?;

    let rendered = render_stream(stream, options.show_thinking, out).await?;

    if options.save_thinking {
        let path = capture::write_raw_transcript(
            &options.debug_dir,
            client.model(),
            task,
            &rendered.raw_text,
        )?;
        info!(path = %path.display(), "raw transcript saved");
    }

    Ok(rendered.text)
}

/// Answer a free-form question from the document
///
/// Sugar over [`report`] with [`ReportTarget::Question`].
///
/// # Errors
/// Same failure modes as [`report`].
pub async fn ask(
    client: &OllamaClient,
    doc: &InventoryDocument,
    question: &str,
    options: &ReportOptions,
    out: &mut dyn Write,
) -> Result<String, ReportError> {
    report(
        client,
        doc,
        &ReportTarget::Question(question.to_string()),
        options,
        out,
    )
    .await
}
