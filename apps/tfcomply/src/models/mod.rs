//! Shared data models for scan inputs, findings and summaries.

pub mod kind;
pub mod rule;

use rule::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One scanned piece of Terraform text, identified by its path relative
/// to the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUnit {
    pub id: String,
    pub text: String,
}

impl ConfigUnit {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        ConfigUnit {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Outcome of evaluating one rule against one unit.
pub enum Severity {
    Pass,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Pass => "pass",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Marker used by the console and markdown reporters.
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Pass => "✅",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single rule outcome for a single unit.
pub struct Finding {
    pub rule: String,
    pub title: String,
    /// `None` only for synthetic findings (unreadable units).
    pub dimension: Option<Dimension>,
    pub unit: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[default]
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail)
    }

    /// Process exit status for the CLI gate.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Per-bucket counts plus the verdict.
pub struct Counts {
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub total: usize,
    pub units: usize,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Aggregated findings for one run. Serializes to the machine-readable
/// payload (`passed`, `warnings`, `errors`, `summary`).
pub struct ScanSummary {
    pub passed: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub errors: Vec<Finding>,
    #[serde(rename = "summary")]
    pub counts: Counts,
}

impl ScanSummary {
    pub fn verdict(&self) -> Verdict {
        self.counts.verdict
    }

    /// All findings, errors first, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .chain(self.passed.iter())
    }
}
