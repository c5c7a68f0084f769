//! Inventory document model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current document schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Core section keys, in collection order
pub const CORE_SECTIONS: [&str; 5] = ["cpu", "memory", "storage", "firmware", "software"];

/// Optional extras section keys
pub const EXTRA_SECTIONS: [&str; 3] = ["docker", "systemd", "kvm"];

/// Structured snapshot of a host's hardware and software facts
///
/// Sections are kept in a `BTreeMap` so serialization has a stable key
/// order regardless of collection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDocument {
    /// Document schema version
    pub schema_version: u32,
    /// Section name to structured facts
    pub sections: BTreeMap<String, Value>,
    /// Issues found while collecting or validating, in order of discovery
    pub validation_issues: Vec<String>,
}

impl InventoryDocument {
    /// Create an empty document at the current schema version
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sections: BTreeMap::new(),
            validation_issues: Vec::new(),
        }
    }

    /// Get a section's facts by name
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Insert or replace a section
    pub fn set_section(&mut self, name: impl Into<String>, facts: Value) {
        self.sections.insert(name.into(), facts);
    }

    /// Record a validation issue
    pub fn push_issue(&mut self, issue: impl Into<String>) {
        self.validation_issues.push(issue.into());
    }

    /// Check the document against the known section set
    ///
    /// Appends an issue for each missing core section and each section key
    /// outside the known set. Missing extras are never an issue.
    pub fn validate(&mut self) {
        for name in CORE_SECTIONS {
            if !self.sections.contains_key(name) {
                self.validation_issues.push(format!("missing section: {name}"));
            }
        }
        let known: Vec<&str> = CORE_SECTIONS.iter().chain(EXTRA_SECTIONS.iter()).copied().collect();
        for key in self.sections.keys() {
            if !known.contains(&key.as_str()) {
                self.validation_issues.push(format!("unknown section: {key}"));
            }
        }
    }
}

impl Default for InventoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_flags_missing_core_sections() {
        let mut doc = InventoryDocument::new();
        doc.set_section("cpu", json!({}));
        doc.validate();

        assert!(doc.validation_issues.contains(&"missing section: memory".to_string()));
        assert!(!doc.validation_issues.iter().any(|i| i.contains("cpu")));
    }

    #[test]
    fn test_validate_flags_unknown_sections() {
        let mut doc = InventoryDocument::new();
        for name in CORE_SECTIONS {
            doc.set_section(name, json!({}));
        }
        doc.set_section("bogus", json!({}));
        doc.validate();

        assert_eq!(doc.validation_issues, vec!["unknown section: bogus".to_string()]);
    }

    #[test]
    fn test_missing_extras_are_not_issues() {
        let mut doc = InventoryDocument::new();
        for name in CORE_SECTIONS {
            doc.set_section(name, json!({}));
        }
        doc.validate();

        assert!(doc.validation_issues.is_empty());
    }

    #[test]
    fn test_serialized_key_order_is_stable() {
        let mut a = InventoryDocument::new();
        a.set_section("memory", json!({}));
        a.set_section("cpu", json!({}));

        let mut b = InventoryDocument::new();
        b.set_section("cpu", json!({}));
        b.set_section("memory", json!({}));

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
