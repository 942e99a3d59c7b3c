//! Configuration discovery and effective settings resolution.
//!
//! tfcomply reads `tfcomply.toml|yaml|yml` from the scan root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `paths`: `["modules/**/*.tf"]`
//! - `output`: `human`
//! - `timeout_ms`: 5000
//! - `max_unit_bytes`: 4 MiB
//! - `jobs`: 0 (rayon default)
//! - `module_name`: name of the root directory
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::catalog::RuleOverride;
use crate::discover::DEFAULT_PATTERNS;
use crate::error::ConfigError;
use crate::scan::{LoadLimits, DEFAULT_MAX_UNIT_BYTES, DEFAULT_TIMEOUT};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_NAMES: [&str; 3] = ["tfcomply.toml", "tfcomply.yaml", "tfcomply.yml"];

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
/// Root configuration loaded from `tfcomply.toml|yaml`.
pub struct FileConfig {
    pub paths: Option<Vec<String>>,
    pub output: Option<String>,
    pub rules_file: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_unit_bytes: Option<u64>,
    pub jobs: Option<usize>,
    pub module_name: Option<String>,
    /// `[rules.<id>]` enable/level overrides
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "human" => Ok(OutputMode::Human),
            "json" => Ok(OutputMode::Json),
            other => Err(ConfigError::Value {
                key: "output".into(),
                message: format!("expected human|json, got `{}`", other),
            }),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, OutputMode::Json)
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    /// Path of the config file that was loaded, if any.
    pub config_file: Option<PathBuf>,
    pub patterns: Vec<String>,
    pub output: OutputMode,
    pub rules_file: Option<PathBuf>,
    pub limits: LoadLimits,
    pub jobs: usize,
    pub module_name: String,
    pub overrides: BTreeMap<String, RuleOverride>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line; `None` defers to the config file.
pub struct CliOverrides {
    pub root: Option<String>,
    pub paths: Vec<String>,
    pub output: Option<String>,
    pub rules_file: Option<String>,
    pub timeout_ms: Option<u64>,
    pub jobs: Option<usize>,
}

/// Walk upward from `start` to detect the scan root.
///
/// Stops when a `tfcomply.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `FileConfig` from `tfcomply.toml` or `tfcomply.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, FileConfig)>, ConfigError> {
    for name in CONFIG_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let cfg: FileConfig = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|source| ConfigError::Toml {
                path: path.clone(),
                source,
            })?
        } else {
            serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?
        };
        return Ok(Some((path, cfg)));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective, ConfigError> {
    let start = PathBuf::from(cli.root.as_deref().unwrap_or("."));
    let root = detect_root(&start);
    let (config_file, cfg) = match load_config(&root)? {
        Some((p, c)) => (Some(p), c),
        None => (None, FileConfig::default()),
    };

    let patterns = if !cli.paths.is_empty() {
        cli.paths.clone()
    } else {
        cfg.paths
            .clone()
            .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect())
    };
    if patterns.is_empty() {
        return Err(ConfigError::Value {
            key: "paths".into(),
            message: "at least one glob pattern is required".into(),
        });
    }

    let output = OutputMode::parse(
        cli.output
            .as_deref()
            .or(cfg.output.as_deref())
            .unwrap_or("human"),
    )?;

    // rules_file is relative to the root it was configured for
    let rules_file = cli
        .rules_file
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| cfg.rules_file.as_ref().map(|p| root.join(p)));

    let timeout = cli
        .timeout_ms
        .or(cfg.timeout_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT);
    if timeout.is_zero() {
        return Err(ConfigError::Value {
            key: "timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    let limits = LoadLimits {
        timeout,
        max_bytes: cfg.max_unit_bytes.unwrap_or(DEFAULT_MAX_UNIT_BYTES),
    };

    let jobs = cli.jobs.or(cfg.jobs).unwrap_or(0);

    let module_name = cfg.module_name.clone().unwrap_or_else(|| {
        fs::canonicalize(&root)
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "Terraform module".to_string())
    });

    Ok(Effective {
        root,
        config_file,
        patterns,
        output,
        rules_file,
        limits,
        jobs,
        module_name,
        overrides: cfg.rules,
    })
}
