//! Persistence for inventory documents

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::document::InventoryDocument;
use crate::error::StoreError;

/// Write a document to `path` as pretty-printed JSON
///
/// Parent directories are created as needed. Section keys serialize in
/// sorted order, so the same document always produces the same bytes.
///
/// # Errors
/// Returns [`StoreError::Io`] if the path is unwritable.
#[instrument(skip(doc))]
pub fn save(doc: &InventoryDocument, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut json = serde_json::to_string_pretty(doc)
        .map_err(|e| StoreError::Format(e.to_string()))?;
    json.push('\n');
    fs::write(path, json)?;

    debug!(path = %path.display(), "document saved");
    Ok(())
}

/// Load a document from a JSON file
///
/// # Errors
/// Returns [`StoreError::Format`] if the content is not valid JSON or lacks
/// an integer `schema_version`, [`StoreError::Io`] if the file is unreadable.
#[instrument]
pub fn load(path: &Path) -> Result<InventoryDocument, StoreError> {
    let content = fs::read_to_string(path)?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| StoreError::Format(format!("invalid JSON: {e}")))?;

    if !value.get("schema_version").is_some_and(Value::is_u64) {
        return Err(StoreError::Format(
            "missing or non-integer schema_version".to_string(),
        ));
    }

    let doc: InventoryDocument = serde_json::from_value(value)
        .map_err(|e| StoreError::Format(e.to_string()))?;

    debug!(path = %path.display(), schema_version = doc.schema_version, "document loaded");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.json");

        let mut doc = InventoryDocument::new();
        doc.set_section("cpu", json!({"model": "Intel X", "cores": 8}));
        doc.set_section("memory", json!({"total_bytes": 16_000_000_000u64}));
        doc.push_issue("storage: lsblk unavailable");

        save(&doc, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_rejects_non_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_load_rejects_missing_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"sections": {}, "validation_issues": []}"#).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_load_rejects_string_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"schema_version": "0.1.0", "sections": {}, "validation_issues": []}"#,
        )
        .unwrap();

        assert!(matches!(load(&path).unwrap_err(), StoreError::Format(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/inventory.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
