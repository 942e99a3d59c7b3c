//! Error types shared by configuration, catalog loading and scanning.
//!
//! Only the errors here ever abort a run. Per-unit problems (`UnitError`)
//! are folded into findings by the evaluator and never reach the caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure while loading `tfcomply.toml|yaml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for `{key}`: {message}")]
    Value { key: String, message: String },
}

/// Failure while building the rule set from a declarative rules file.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rules file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid regex in {owner}: {source}")]
    Regex {
        owner: String,
        #[source]
        source: regex::Error,
    },
    #[error("{owner}: pattern must set exactly one of `literal` or `regex`")]
    AmbiguousPattern { owner: String },
    #[error("duplicate rule id `{0}`")]
    DuplicateRule(String),
    #[error("duplicate resource kind `{0}`")]
    DuplicateKind(String),
    #[error("rule `{rule}` references unknown resource kind `{kind}`")]
    UnknownKind { rule: String, kind: String },
    #[error("rule `{0}` has no required conditions")]
    EmptyRule(String),
    #[error("rule `{0}` applies to no resource kind")]
    NoKinds(String),
    #[error("unknown rule id `{0}` in [rules] overrides")]
    UnknownOverride(String),
}

/// Failure that stops a scan before any finding is produced.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no Terraform files found (looked for {})", .patterns.join(", "))]
    EmptyCorpus { patterns: Vec<String> },
    #[error("bad glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single unit could not be loaded.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("read timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("file is not valid UTF-8")]
    NotUtf8,
}

/// Any failure that ends a CLI run before a verdict exists.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// 1 for an empty corpus (a failed audit), 2 for usage and setup errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Scan(ScanError::EmptyCorpus { .. }) => 1,
            _ => 2,
        }
    }
}
