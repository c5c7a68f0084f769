//! High-level inventory collection

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde_json::{Value, json};
use spektor_exec::CommandRunner;
use spektor_exec::traits::DEFAULT_TIMEOUT;
use tracing::{info, instrument, warn};

use crate::document::InventoryDocument;
use crate::probes::{self, ProbeContext};

/// Optional, opt-in probes beyond the default set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    Docker,
    Systemd,
    Kvm,
}

impl Extra {
    /// Section key this extra populates
    #[must_use]
    pub fn section_name(self) -> &'static str {
        match self {
            Extra::Docker => "docker",
            Extra::Systemd => "systemd",
            Extra::Kvm => "kvm",
        }
    }
}

impl FromStr for Extra {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(Extra::Docker),
            "systemd" => Ok(Extra::Systemd),
            "kvm" => Ok(Extra::Kvm),
            other => Err(format!("unknown extra: {other}")),
        }
    }
}

/// Options for one collection run
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Per-command timeout
    pub timeout: Duration,
    /// Extras to include; absence of an extra is never a validation issue
    pub extras: Vec<Extra>,
    /// When set, every command result is written there as a JSON artifact
    pub raw_dir: Option<PathBuf>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            extras: Vec::new(),
            raw_dir: None,
        }
    }
}

fn placeholder(reason: &str) -> Value {
    json!({ "available": false, "reason": reason })
}

/// Collect a fresh inventory document
///
/// Probes run sequentially in a fixed order. A failing probe populates its
/// section with a placeholder and appends a validation issue; it never
/// aborts the run. The returned document always carries `schema_version`.
#[instrument(skip(runner, options))]
pub async fn collect(runner: &dyn CommandRunner, options: &CollectOptions) -> InventoryDocument {
    info!(timeout = ?options.timeout, extras = options.extras.len(), "collecting inventory");

    let mut doc = InventoryDocument::new();
    let ctx = ProbeContext::new(runner, options.timeout, options.raw_dir.as_deref());

    let core: [(&str, Result<Value, String>); 5] = [
        ("cpu", probes::cpu(&ctx).await),
        ("memory", probes::memory(&ctx).await),
        ("storage", probes::storage(&ctx).await),
        ("firmware", probes::firmware(&ctx).await),
        ("software", probes::software(&ctx).await),
    ];

    for (name, outcome) in core {
        record(&mut doc, name, outcome);
    }

    for extra in &options.extras {
        let outcome = match extra {
            Extra::Docker => probes::docker(&ctx).await,
            Extra::Systemd => probes::systemd(&ctx).await,
            Extra::Kvm => probes::kvm(&ctx).await,
        };
        record(&mut doc, extra.section_name(), outcome);
    }

    doc.validate();

    info!(
        sections = doc.sections.len(),
        issues = doc.validation_issues.len(),
        "inventory collection completed"
    );
    doc
}

fn record(doc: &mut InventoryDocument, name: &str, outcome: Result<Value, String>) {
    match outcome {
        Ok(facts) => doc.set_section(name, facts),
        Err(reason) => {
            warn!(probe = name, reason = %reason, "probe failed");
            doc.set_section(name, placeholder(&reason));
            doc.push_issue(format!("{name}: {reason}"));
        }
    }
}
