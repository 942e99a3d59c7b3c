//! Scan pipeline: load units, classify and evaluate them in parallel, then
//! merge everything into one summary.
//!
//! Units are independent; the only synchronization point is the final
//! aggregation after the parallel map has been collected. Unit read
//! failures become findings and never abort the run.

use crate::aggregate::Aggregator;
use crate::catalog::Catalog;
use crate::discover::unit_id;
use crate::error::{ScanError, UnitError};
use crate::evaluate::{evaluate, unreadable};
use crate::models::{ConfigUnit, Finding, ScanSummary};
use rayon::prelude::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_UNIT_BYTES: u64 = 4 * 1024 * 1024;

/// Bounds applied when loading each unit.
#[derive(Debug, Clone, Copy)]
pub struct LoadLimits {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for LoadLimits {
    fn default() -> Self {
        LoadLimits {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_UNIT_BYTES,
        }
    }
}

fn read_bounded(path: &Path, max: u64) -> Result<Vec<u8>, UnitError> {
    let size = fs::metadata(path)?.len();
    if size > max {
        return Err(UnitError::TooLarge { size, limit: max });
    }
    let mut buf = Vec::new();
    // the file may grow after the metadata check
    fs::File::open(path)?.take(max + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > max {
        return Err(UnitError::TooLarge {
            size: buf.len() as u64,
            limit: max,
        });
    }
    Ok(buf)
}

/// Read one file as a unit, bounded by size and time.
///
/// Both the stat and the read run on a helper thread; on timeout the thread
/// is abandoned and finishes (or blocks) on its own.
pub fn load_unit(id: String, path: &Path, limits: LoadLimits) -> Result<ConfigUnit, UnitError> {
    let (tx, rx) = mpsc::channel();
    let owned: PathBuf = path.to_path_buf();
    let max = limits.max_bytes;
    thread::spawn(move || {
        let _ = tx.send(read_bounded(&owned, max));
    });
    let bytes = match rx.recv_timeout(limits.timeout) {
        Ok(res) => res?,
        Err(_) => return Err(UnitError::Timeout(limits.timeout)),
    };
    let text = String::from_utf8(bytes).map_err(|_| UnitError::NotUtf8)?;
    Ok(ConfigUnit { id, text })
}

/// Core entry point: classifier plus rule set, shared read-only by workers.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    catalog: Catalog,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Engine { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Classify and evaluate one loaded unit.
    pub fn check_unit(&self, unit: &ConfigUnit) -> Vec<Finding> {
        let kinds = self.catalog.classifier.classify(unit);
        debug!(unit = %unit.id, kinds = kinds.len(), "classified");
        evaluate(unit, &kinds, &self.catalog.rules)
    }

    fn check_loaded(&self, id: &str, loaded: Result<ConfigUnit, UnitError>) -> Vec<Finding> {
        match loaded {
            Ok(unit) => self.check_unit(&unit),
            Err(e) => {
                warn!(unit = %id, "unit could not be read: {}", e);
                vec![unreadable(id, &e)]
            }
        }
    }

    /// Scan in-memory `(identifier, text)` pairs, sequentially.
    pub fn scan_texts<I, S, T>(&self, units: I) -> ScanSummary
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut agg = Aggregator::new();
        let mut count = 0usize;
        for (id, text) in units {
            count += 1;
            agg.extend(self.check_unit(&ConfigUnit::new(id, text)));
        }
        agg.with_units(count).finish()
    }

    /// Load and scan `files` in parallel. Findings are merged in file order.
    pub fn scan_files(&self, root: &Path, files: &[PathBuf], limits: LoadLimits) -> ScanSummary {
        let per_unit: Vec<Vec<Finding>> = files
            .par_iter()
            .map(|path| {
                let id = unit_id(root, path);
                let loaded = load_unit(id.clone(), path, limits);
                self.check_loaded(&id, loaded)
            })
            .collect();
        let mut agg = Aggregator::new();
        for findings in per_unit {
            agg.extend(findings);
        }
        let summary = agg.with_units(files.len()).finish();
        info!(
            units = summary.counts.units,
            passed = summary.counts.passed,
            warnings = summary.counts.warnings,
            errors = summary.counts.errors,
            "scan finished"
        );
        summary
    }

    /// `scan_files` on a dedicated pool of `jobs` threads (0 = rayon default).
    pub fn scan_files_with_jobs(
        &self,
        root: &Path,
        files: &[PathBuf],
        limits: LoadLimits,
        jobs: usize,
    ) -> Result<ScanSummary, ScanError> {
        if jobs == 0 {
            return Ok(self.scan_files(root, files, limits));
        }
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        Ok(pool.install(|| self.scan_files(root, files, limits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::discover;
    use crate::evaluate::UNIT_READ_RULE;
    use crate::models::Severity;
    use std::fs;
    use tempfile::tempdir;

    const VERSIONING_DISABLED: &str = r#"
resource "aws_s3_bucket_versioning" "phi" {
  versioning_configuration {
    status = "Disabled"
  }
}
"#;

    #[test]
    fn test_scan_texts_counts_units() {
        let engine = Engine::default();
        let summary = engine.scan_texts(vec![
            ("a.tf", "variable \"x\" {}"),
            ("b.tf", VERSIONING_DISABLED),
        ]);
        assert_eq!(summary.counts.units, 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].unit, "b.tf");
        assert!(summary.verdict().is_fail());
    }

    #[test]
    fn test_same_rule_fires_per_unit() {
        let engine = Engine::default();
        let summary = engine.scan_texts(vec![
            ("a.tf", VERSIONING_DISABLED),
            ("b.tf", VERSIONING_DISABLED),
        ]);
        let units: Vec<_> = summary
            .errors
            .iter()
            .filter(|f| f.rule == "VER-002")
            .map(|f| f.unit.as_str())
            .collect();
        assert_eq!(units, vec!["a.tf", "b.tf"]);
    }

    #[test]
    fn test_scan_files_is_idempotent_and_ordered() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("modules/phi")).unwrap();
        fs::write(root.join("modules/phi/versioning.tf"), VERSIONING_DISABLED).unwrap();
        fs::write(
            root.join("modules/phi/kms.tf"),
            "resource \"aws_kms_key\" \"k\" {\n  enable_key_rotation = true\n}\n",
        )
        .unwrap();
        let files = discover(root, &["modules/**/*.tf".to_string()]).unwrap();
        let engine = Engine::default();
        let first = engine.scan_files(root, &files, LoadLimits::default());
        let second = engine
            .scan_files_with_jobs(root, &files, LoadLimits::default(), 2)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.counts.units, 2);
        assert_eq!(first.passed[0].unit, "modules/phi/kms.tf");
        assert_eq!(first.errors[0].unit, "modules/phi/versioning.tf");
    }

    #[test]
    fn test_unreadable_unit_becomes_finding() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("modules")).unwrap();
        fs::write(root.join("modules/bad.tf"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(
            root.join("modules/ok.tf"),
            "resource \"aws_kms_key\" \"k\" {\n  enable_key_rotation = true\n}\n",
        )
        .unwrap();
        let files = discover(root, &["modules/*.tf".to_string()]).unwrap();
        let summary = Engine::default().scan_files(root, &files, LoadLimits::default());
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].rule, UNIT_READ_RULE);
        assert_eq!(summary.errors[0].unit, "modules/bad.tf");
        assert_eq!(summary.passed.len(), 1);
        assert_eq!(summary.passed[0].severity, Severity::Pass);
    }

    #[test]
    fn test_size_limit_is_enforced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.tf");
        fs::write(&path, "x".repeat(64)).unwrap();
        let limits = LoadLimits {
            max_bytes: 16,
            ..LoadLimits::default()
        };
        let err = load_unit("big.tf".into(), &path, limits).unwrap_err();
        assert!(matches!(err, UnitError::TooLarge { size: 64, limit: 16 }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_unit("gone.tf".into(), &dir.path().join("gone.tf"), LoadLimits::default())
            .unwrap_err();
        assert!(matches!(err, UnitError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_stalled_read_times_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stalled.tf");
        // a FIFO with no writer blocks on open
        let status = std::process::Command::new("mkfifo").arg(&path).status().unwrap();
        assert!(status.success());
        let limits = LoadLimits {
            timeout: Duration::from_millis(200),
            ..LoadLimits::default()
        };

        let loaded = load_unit("modules/stalled.tf".into(), &path, limits);
        assert!(matches!(loaded, Err(UnitError::Timeout(t)) if t == Duration::from_millis(200)));

        let findings = Engine::default().check_loaded("modules/stalled.tf", loaded);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, UNIT_READ_RULE);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("timed out after 200 ms"));
    }
}
