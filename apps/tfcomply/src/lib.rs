//! tfcomply core library.
//!
//! This crate exposes programmatic APIs for auditing Terraform files against
//! a table of HIPAA-oriented compliance rules.
//!
//! Data flows one way: text units -> `classify` -> `evaluate` (using the
//! `catalog` rule set) -> `aggregate` -> printers.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `catalog`: Builtin rule table, rules files and overrides.
//! - `classify`: Resource-kind recognition over raw text.
//! - `evaluate`: Per-unit rule evaluation into findings.
//! - `aggregate`: Findings into a `ScanSummary` with a verdict.
//! - `discover`: Glob-based corpus discovery.
//! - `scan`: Bounded loading and the parallel pipeline.
//! - `models`: Units, kinds, rules, findings and summaries.
//! - `output`: Human/JSON printers for `check` and `rules`.
//! - `report`: Markdown narrative report.
pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod evaluate;
pub mod models;
pub mod output;
pub mod report;
pub mod scan;
pub mod utils;

pub use aggregate::aggregate;
pub use catalog::{Catalog, RuleSet};
pub use evaluate::evaluate;
pub use models::{ConfigUnit, Finding, ScanSummary, Severity, Verdict};
pub use scan::Engine;
