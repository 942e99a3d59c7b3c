//! Aggregation of findings into a `ScanSummary`.

use crate::models::{Counts, Finding, ScanSummary, Severity, Verdict};

/// Incremental summary builder; buckets keep insertion order.
#[derive(Debug, Default)]
pub struct Aggregator {
    summary: ScanSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Pass => self.summary.passed.push(finding),
            Severity::Warning => self.summary.warnings.push(finding),
            Severity::Error => self.summary.errors.push(finding),
        }
    }

    /// Record the number of units that contributed findings (or not).
    pub fn with_units(mut self, units: usize) -> Self {
        self.summary.counts.units = units;
        self
    }

    pub fn finish(self) -> ScanSummary {
        let mut summary = self.summary;
        let (passed, warnings, errors) = (
            summary.passed.len(),
            summary.warnings.len(),
            summary.errors.len(),
        );
        summary.counts = Counts {
            passed,
            warnings,
            errors,
            total: passed + warnings + errors,
            units: summary.counts.units,
            verdict: if errors > 0 {
                Verdict::Fail
            } else {
                Verdict::Pass
            },
        };
        summary
    }
}

impl Extend<Finding> for Aggregator {
    fn extend<I: IntoIterator<Item = Finding>>(&mut self, iter: I) {
        for f in iter {
            self.push(f);
        }
    }
}

/// Bucket `findings` by severity and derive the verdict.
pub fn aggregate(findings: impl IntoIterator<Item = Finding>) -> ScanSummary {
    let mut agg = Aggregator::new();
    agg.extend(findings);
    agg.finish()
}
