//! Console rendering for `check` and `rules`.
//!
//! Supports `human` (default) and `json` outputs. The JSON form of a check
//! is the serialized `ScanSummary` (`passed`, `warnings`, `errors`,
//! `summary`).

use crate::catalog::RuleSet;
use crate::config::OutputMode;
use crate::models::{Finding, ScanSummary, Severity};
use crate::utils::use_colors;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fmt::Write;

const RULE: &str = "============================================================";

/// Print check results in the requested format.
pub fn print_check(summary: &ScanSummary, output: OutputMode) {
    match output {
        OutputMode::Json => println!("{}", compose_check_json(summary)),
        OutputMode::Human => print!("{}", render_check_human(summary, use_colors(false))),
    }
}

/// Pretty JSON for a summary.
pub fn compose_check_json(summary: &ScanSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|e| {
        json!({"error": format!("failed to serialize summary: {}", e)}).to_string()
    })
}

fn line(f: &Finding, color: bool) -> String {
    let rule = format!("❲{}❳", f.rule);
    if color {
        format!("  - {} {} {}", f.unit.bold(), rule.dimmed(), f.message)
    } else {
        format!("  - {} {} {}", f.unit, rule, f.message)
    }
}

fn heading(sev: Severity, text: &str, color: bool) -> String {
    let raw = format!("{} {}", sev.marker(), text);
    if !color {
        return raw;
    }
    match sev {
        Severity::Pass => raw.green().bold().to_string(),
        Severity::Warning => raw.yellow().bold().to_string(),
        Severity::Error => raw.red().bold().to_string(),
    }
}

/// Human report: totals, then passed/warning/error buckets, then verdict.
pub fn render_check_human(summary: &ScanSummary, color: bool) -> String {
    let c = &summary.counts;
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", RULE);
    let _ = writeln!(out, "HIPAA COMPLIANCE CHECK REPORT");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "\nTotal files scanned: {}", c.units);
    let _ = writeln!(out, "Total checks performed: {}", c.total);
    let _ = writeln!(out, "Passed: {}", c.passed);
    let _ = writeln!(out, "Errors: {}", c.errors);
    let _ = writeln!(out, "Warnings: {}", c.warnings);

    let buckets = [
        (Severity::Pass, "PASSED CHECKS:", &summary.passed),
        (Severity::Warning, "WARNINGS:", &summary.warnings),
        (Severity::Error, "ERRORS:", &summary.errors),
    ];
    for (sev, title, items) in buckets {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", heading(sev, title, color));
        for f in items.iter() {
            let _ = writeln!(out, "{}", line(f, color));
        }
    }

    let _ = writeln!(out, "\n{}", RULE);
    let verdict = if summary.verdict().is_fail() {
        heading(Severity::Error, "HIPAA compliance check FAILED", color)
    } else {
        heading(Severity::Pass, "HIPAA compliance check PASSED", color)
    };
    let _ = writeln!(out, "\n{}", verdict);
    out
}

/// Print the effective rule table.
pub fn print_rules(rules: &RuleSet, output: OutputMode) {
    match output {
        OutputMode::Json => println!(
            "{}",
            serde_json::to_string_pretty(&compose_rules_json(rules)).unwrap_or_default()
        ),
        OutputMode::Human => {
            let color = use_colors(false);
            for r in rules {
                let kinds = r
                    .kinds
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                let level = if color {
                    match r.level {
                        crate::models::rule::Level::Error => r.level.as_str().red().to_string(),
                        crate::models::rule::Level::Warning => {
                            r.level.as_str().yellow().to_string()
                        }
                    }
                } else {
                    r.level.as_str().to_string()
                };
                println!(
                    "{:<8} {:<8} {:<22} [{}] {}",
                    r.id,
                    level,
                    r.dimension.as_str(),
                    kinds,
                    r.title
                );
            }
        }
    }
}

/// Compose rules JSON (pure) for testing purposes.
pub fn compose_rules_json(rules: &RuleSet) -> JsonVal {
    let items: Vec<_> = rules.iter().collect();
    json!({"rules": items, "total": rules.len()})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Engine;

    fn summary() -> ScanSummary {
        Engine::default().scan_texts(vec![
            (
                "modules/kms.tf",
                "resource \"aws_kms_key\" \"k\" {\n  description = \"x\"\n}\n",
            ),
            (
                "modules/ver.tf",
                "resource \"aws_s3_bucket_versioning\" \"v\" {\n  versioning_configuration {\n    status = \"Enabled\"\n  }\n}\n",
            ),
        ])
    }

    #[test]
    fn test_render_human_lists_buckets_and_verdict() {
        let out = render_check_human(&summary(), false);
        assert!(out.contains("Total files scanned: 2"));
        assert!(out.contains("Errors: 1"));
        assert!(out.contains("✅ PASSED CHECKS:"));
        assert!(out.contains("❌ ERRORS:"));
        assert!(out.contains("  - modules/kms.tf ❲KMS-001❳ KMS key rotation must be enabled"));
        assert!(out.trim_end().ends_with("HIPAA compliance check FAILED"));
    }

    #[test]
    fn test_render_human_pass_verdict() {
        let s = Engine::default().scan_texts(vec![("a.tf", "locals {}")]);
        let out = render_check_human(&s, false);
        assert!(!out.contains("PASSED CHECKS"));
        assert!(out.trim_end().ends_with("HIPAA compliance check PASSED"));
    }

    #[test]
    fn test_compose_check_json_shape() {
        let v: JsonVal = serde_json::from_str(&compose_check_json(&summary())).unwrap();
        assert_eq!(v["summary"]["errors"], 1);
        assert_eq!(v["summary"]["verdict"], "fail");
        assert_eq!(v["errors"][0]["rule"], "KMS-001");
        assert_eq!(v["errors"][0]["dimension"], "key-rotation");
        assert!(v["warnings"].is_array());
        assert!(v["passed"].is_array());
    }

    #[test]
    fn test_compose_rules_json_lists_builtin_table() {
        let rules = RuleSet::builtin();
        let v = compose_rules_json(&rules);
        assert_eq!(v["total"], rules.len());
        let first = &v["rules"][0];
        assert_eq!(first["id"], "ENC-001");
        assert_eq!(first["level"], "warning");
        assert_eq!(first["kinds"][0], "storage_bucket");
        assert_eq!(first["waiver"], "checkov:skip=CKV_AWS_145");
    }
}
