//! Corpus discovery: expand glob patterns under the scan root.

use crate::error::ScanError;
use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default corpus: every Terraform file below `modules/`.
pub const DEFAULT_PATTERNS: &[&str] = &["modules/**/*.tf"];

/// Files matching `patterns` (relative to `root`), sorted and de-duplicated.
///
/// Returns `ScanError::EmptyCorpus` when nothing matches, so callers never
/// evaluate an empty corpus.
pub fn discover(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    // the root is a literal path, only `pat` carries glob syntax
    let base = Pattern::escape(&root.to_string_lossy());
    for pat in patterns {
        let pattern = format!("{}/{}", base.trim_end_matches('/'), pat);
        let entries = glob(&pattern).map_err(|source| ScanError::Pattern {
            pattern: pat.clone(),
            source,
        })?;
        for entry in entries {
            match entry {
                Ok(p) if p.is_file() => {
                    files.insert(p);
                }
                Ok(_) => {}
                Err(e) => warn!(path = %e.path().display(), "skipping unreadable path: {}", e.error()),
            }
        }
    }
    debug!(count = files.len(), "discovered files");
    if files.is_empty() {
        return Err(ScanError::EmptyCorpus {
            patterns: patterns.to_vec(),
        });
    }
    Ok(files.into_iter().collect())
}

/// Unit identifier: path relative to `root` with `/` separators.
pub fn unit_id(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
