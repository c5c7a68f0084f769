//! Debug capture for model sessions
//!
//! When enabled, raw streamed NDJSON lines are appended to a per-session
//! log, a metadata record is written next to it, and full raw transcripts
//! (thinking included) can be persisted as text files. Capture is
//! side-effecting only; it never alters what the caller sees.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// Replace anything outside `[A-Za-z0-9._-]` so values are filename-safe
#[must_use]
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Session id derived from timestamp and pid
#[must_use]
pub fn session_id() -> String {
    format!(
        "{}_{:x}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        std::process::id()
    )
}

/// Raw chunk log for one model session
pub struct SessionCapture {
    log_path: PathBuf,
    meta_path: PathBuf,
    file: File,
}

impl SessionCapture {
    /// Open a new session log under `dir`, creating the directory
    ///
    /// # Errors
    /// Returns an error if the directory or log file cannot be created.
    pub fn new(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let session = session_id();
        let log_path = dir.join(format!("ollama_{session}.jsonl"));
        let meta_path = dir.join(format!("ollama_{session}.meta.json"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        debug!(path = %log_path.display(), "model session capture enabled");
        Ok(Self {
            log_path,
            meta_path,
            file,
        })
    }

    /// Path of the jsonl log
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Append one raw NDJSON line; write failures are logged, not raised
    pub fn record_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.file, "{line}") {
            warn!(path = %self.log_path.display(), error = %e, "failed to append capture line");
        }
    }

    /// Write the session metadata record
    pub fn write_meta(&self, meta: &Value) {
        let write = serde_json::to_string_pretty(meta)
            .map_err(std::io::Error::other)
            .and_then(|mut json| {
                json.push('\n');
                fs::write(&self.meta_path, json)
            });
        if let Err(e) = write {
            warn!(path = %self.meta_path.display(), error = %e, "failed to write capture meta");
        }
    }
}

/// Persist a full raw transcript, named from timestamp, model and task
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn write_raw_transcript(
    dir: &Path,
    model: &str,
    task: &str,
    raw_text: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let model = sanitize(&model.replace(':', "-"));
    let path = dir.join(format!("{timestamp}_{model}_{}.raw.txt", sanitize(task)));
    fs::write(&path, raw_text)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("gemma3:12b"), "gemma3-12b");
        assert_eq!(sanitize("safe._-name"), "safe._-name");
        assert_eq!(sanitize("a b/c"), "a-b-c");
    }

    #[test]
    fn test_session_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut capture = SessionCapture::new(dir.path()).unwrap();
        capture.record_line(r#"{"response":"a"}"#);
        capture.record_line(r#"{"done":true}"#);
        capture.write_meta(&json!({"model": "test"}));

        let log = std::fs::read_to_string(capture.log_path()).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn test_write_raw_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_raw_transcript(dir.path(), "gemma3:12b", "overview", "raw text").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains("gemma3-12b"));
        assert!(name.contains("overview"));
        assert!(name.ends_with(".raw.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "raw text");
    }
}
