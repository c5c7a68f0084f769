//! Prompt composition

use std::path::Path;

use serde_json::{Map, Value, json};
use spektor_inventory::InventoryDocument;

use crate::error::ReportError;

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "Use ONLY provided JSON. If missing, \
state what to run to obtain it. Bullet points. Reference JSON paths.";

/// Package entries kept when compacting a document for prompting
pub const PACKAGE_PROMPT_LIMIT: usize = 100;

/// What the report should cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    /// Whole-document summary
    Overview,
    /// Named sections only
    Sections(Vec<String>),
    /// Free-form question answered strictly from the document
    Question(String),
}

/// Resolve a user-supplied system prompt
///
/// Treated as a file path when one exists there, else as literal text; the
/// built-in default when absent.
#[must_use]
pub fn resolve_system_prompt(supplied: Option<&str>) -> String {
    match supplied {
        Some(value) => {
            let path = Path::new(value);
            if path.is_file()
                && let Ok(content) = std::fs::read_to_string(path)
            {
                return content;
            }
            value.to_string()
        }
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}

/// Compact a document for prompting: long package lists are truncated with
/// a `(+N more)` marker
fn compact(doc: &InventoryDocument) -> Value {
    let mut value = serde_json::to_value(doc).unwrap_or(Value::Null);

    if let Some(items) = value
        .pointer_mut("/sections/software/packages/items")
        .and_then(Value::as_array_mut)
        && items.len() > PACKAGE_PROMPT_LIMIT
    {
        let remaining = items.len() - PACKAGE_PROMPT_LIMIT;
        items.truncate(PACKAGE_PROMPT_LIMIT);
        items.push(json!(format!("(+{remaining} more)")));
        if let Some(truncated) = value.pointer_mut("/sections/software/packages/truncated") {
            *truncated = json!(true);
        }
    }

    value
}

/// Build the prompt for a target
///
/// Overview and question prompts embed the whole compacted document;
/// section prompts embed only the named sections' subtrees.
///
/// # Errors
/// Returns [`ReportError::UnknownSection`] when a named section is not in
/// the document.
pub fn build_prompt(
    doc: &InventoryDocument,
    target: &ReportTarget,
) -> Result<(&'static str, String), ReportError> {
    match target {
        ReportTarget::Overview => {
            let payload = render_json(&compact(doc));
            Ok((
                "overview",
                format!(
                    "Summarise hardware and software capabilities with constraints. \
                     Call out virtualization readiness, GPU status, storage, networking.\n{payload}"
                ),
            ))
        }
        ReportTarget::Sections(names) => {
            let mut subset = Map::new();
            for name in names {
                let section = doc
                    .section(name)
                    .ok_or_else(|| ReportError::UnknownSection(name.clone()))?;
                subset.insert(name.clone(), section.clone());
            }
            let list = names.join(", ");
            let payload = render_json(&Value::Object(subset));
            Ok((
                "section",
                format!(
                    "Provide actionable checks for sections: {list}. \
                     Highlight missing data and remediation commands.\n{payload}"
                ),
            ))
        }
        ReportTarget::Question(question) => {
            let payload = render_json(&compact(doc));
            Ok((
                "query",
                format!(
                    "Question: {question}\nAnswer strictly from the supplied JSON. \
                     If a needed fact is absent, name the inventory commands that \
                     would have to be run again to obtain it.\n{payload}"
                ),
            ))
        }
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
