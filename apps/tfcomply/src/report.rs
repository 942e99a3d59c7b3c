//! Markdown narrative report for `tfcomply report`.
//!
//! Consumes only a `ScanSummary`: one section per compliance dimension,
//! an overall status, and the recommendations attached to non-passing
//! findings.

use crate::models::rule::Dimension;
use crate::models::{Finding, ScanSummary};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Header values that do not come from the scan itself.
pub struct ReportMeta {
    pub module_name: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportMeta {
    pub fn now(module_name: impl Into<String>) -> Self {
        ReportMeta {
            module_name: module_name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
        }
    }
}

fn finding_line(out: &mut String, f: &Finding) {
    let _ = writeln!(
        out,
        "- {} `{}` {}: {}",
        f.severity.marker().trim_end(),
        f.rule,
        f.unit,
        f.message
    );
}

/// Render the full markdown document.
pub fn render_report(summary: &ScanSummary, meta: &ReportMeta) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# HIPAA Compliance Report\n");
    let _ = writeln!(
        out,
        "**Generated on:** {}  ",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "**Module:** {}  ", meta.module_name);
    let _ = writeln!(out, "**Version:** {}  \n", meta.version);
    let _ = writeln!(out, "---\n");

    for dim in Dimension::ALL {
        let items: Vec<&Finding> = summary
            .iter()
            .filter(|f| f.dimension == Some(dim))
            .collect();
        let _ = writeln!(out, "## {}\n", dim.title());
        if items.is_empty() {
            let _ = writeln!(out, "_No applicable resources found._\n");
            continue;
        }
        for f in items {
            finding_line(&mut out, f);
        }
        out.push('\n');
    }

    let unreadable: Vec<&Finding> = summary.iter().filter(|f| f.dimension.is_none()).collect();
    if !unreadable.is_empty() {
        let _ = writeln!(out, "## Unreadable Files\n");
        for f in unreadable {
            finding_line(&mut out, f);
        }
        out.push('\n');
    }

    let c = &summary.counts;
    let status = if summary.verdict().is_fail() {
        "❌ NON-COMPLIANT"
    } else {
        "✅ COMPLIANT"
    };
    let _ = writeln!(out, "## Compliance Summary\n");
    let _ = writeln!(out, "### Overall Compliance Status: {}\n", status);
    let _ = writeln!(out, "| Result | Count |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Files scanned | {} |", c.units);
    let _ = writeln!(out, "| Passed | {} |", c.passed);
    let _ = writeln!(out, "| Warnings | {} |", c.warnings);
    let _ = writeln!(out, "| Errors | {} |\n", c.errors);

    let mut recs: Vec<&str> = Vec::new();
    for f in summary.errors.iter().chain(summary.warnings.iter()) {
        if let Some(r) = f.recommendation.as_deref() {
            if !recs.contains(&r) {
                recs.push(r);
            }
        }
    }
    if !recs.is_empty() {
        let _ = writeln!(out, "### Recommendations\n");
        for (i, r) in recs.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, r);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "---\n");
    let _ = writeln!(
        out,
        "*This report is automatically generated based on the Terraform configuration. \nFor detailed compliance validation, please run security scans and conduct manual reviews.*"
    );
    out
}
