//! Rule records: the compliance checks the evaluator applies.
//!
//! A rule is bound to one or more resource kinds and lists the textual
//! conditions a unit must satisfy once one of those kinds is present.
//! Rules are built once (builtin table or rules file) and never mutated.

use super::kind::ResourceKind;
use super::Severity;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity reported when a rule's condition fails.
pub enum Level {
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Warning => Severity::Warning,
            Level::Error => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Compliance dimension a rule belongs to; drives report sections.
pub enum Dimension {
    EncryptionAtRest,
    EncryptionInTransit,
    AccessControl,
    Versioning,
    AuditLogging,
    KeyRotation,
    LifecycleRetention,
    Replication,
    ObjectImmutability,
    Monitoring,
}

impl Dimension {
    pub const ALL: [Dimension; 10] = [
        Dimension::EncryptionAtRest,
        Dimension::EncryptionInTransit,
        Dimension::AccessControl,
        Dimension::Versioning,
        Dimension::AuditLogging,
        Dimension::KeyRotation,
        Dimension::LifecycleRetention,
        Dimension::Replication,
        Dimension::ObjectImmutability,
        Dimension::Monitoring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::EncryptionAtRest => "encryption-at-rest",
            Dimension::EncryptionInTransit => "encryption-in-transit",
            Dimension::AccessControl => "access-control",
            Dimension::Versioning => "versioning",
            Dimension::AuditLogging => "audit-logging",
            Dimension::KeyRotation => "key-rotation",
            Dimension::LifecycleRetention => "lifecycle-retention",
            Dimension::Replication => "replication",
            Dimension::ObjectImmutability => "object-immutability",
            Dimension::Monitoring => "monitoring",
        }
    }

    /// Section heading used by the narrative report.
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::EncryptionAtRest => "Encryption at Rest",
            Dimension::EncryptionInTransit => "Encryption in Transit",
            Dimension::AccessControl => "Access Controls",
            Dimension::Versioning => "Data Integrity",
            Dimension::AuditLogging => "Audit Logging",
            Dimension::KeyRotation => "Key Rotation",
            Dimension::LifecycleRetention => "Lifecycle and Retention",
            Dimension::Replication => "Replication",
            Dimension::ObjectImmutability => "Object Immutability",
            Dimension::Monitoring => "Monitoring and Alerting",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
/// A predicate over raw unit text: plain substring or regular expression.
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn literal(s: impl Into<String>) -> Self {
        Pattern::Literal(s.into())
    }

    pub fn regex(src: &str) -> Result<Self, regex::Error> {
        Regex::new(src).map(Pattern::Regex)
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(s) => text.contains(s.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(s) => s,
            Pattern::Regex(re) => re.as_str(),
        }
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
/// One required textual condition; `label` names it in failure messages.
pub struct Condition {
    pub label: String,
    pub pattern: Pattern,
}

impl Condition {
    pub fn new(label: impl Into<String>, pattern: Pattern) -> Self {
        Condition {
            label: label.into(),
            pattern,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// A named compliance check.
///
/// `message` may contain `{missing}` (comma-separated labels of the failed
/// conditions) and `{unit}` (the unit identifier).
pub struct Rule {
    pub id: String,
    pub title: String,
    pub dimension: Dimension,
    pub kinds: Vec<ResourceKind>,
    pub requires: Vec<Condition>,
    pub level: Level,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Text that, when present in a unit, switches the rule off for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiver: Option<Pattern>,
    /// Units whose identifier matches are exempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exempt_units: Option<Pattern>,
}

impl Rule {
    pub fn applies_to(&self, kinds: &BTreeSet<ResourceKind>) -> bool {
        self.kinds.iter().any(|k| kinds.contains(k))
    }

    /// Whether the rule is switched off for this unit by waiver or exemption.
    pub fn is_waived(&self, unit_id: &str, text: &str) -> bool {
        self.waiver.as_ref().is_some_and(|w| w.is_match(text))
            || self
                .exempt_units
                .as_ref()
                .is_some_and(|e| e.is_match(unit_id))
    }

    pub fn render_message(&self, unit_id: &str, missing: &[&str]) -> String {
        self.message
            .replace("{missing}", &missing.join(", "))
            .replace("{unit}", unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rule {
        Rule {
            id: "T-001".into(),
            title: "test".into(),
            dimension: Dimension::Versioning,
            kinds: vec![ResourceKind::VersioningConfig],
            requires: vec![Condition::new("enabled", Pattern::literal("Enabled"))],
            level: Level::Error,
            message: "{unit}: missing {missing}".into(),
            recommendation: None,
            waiver: Some(Pattern::literal("skip=T-001")),
            exempt_units: Some(Pattern::regex("(?i)log").unwrap()),
        }
    }

    #[test]
    fn test_render_message_placeholders() {
        let r = sample();
        assert_eq!(
            r.render_message("a/main.tf", &["x", "y"]),
            "a/main.tf: missing x, y"
        );
    }

    #[test]
    fn test_waiver_and_exemption() {
        let r = sample();
        assert!(r.is_waived("main.tf", "# skip=T-001"));
        assert!(r.is_waived("modules/Logs/main.tf", ""));
        assert!(!r.is_waived("main.tf", "resource"));
    }

    #[test]
    fn test_applies_to_intersection() {
        let r = sample();
        let mut kinds = BTreeSet::new();
        assert!(!r.applies_to(&kinds));
        kinds.insert(ResourceKind::StorageBucket);
        assert!(!r.applies_to(&kinds));
        kinds.insert(ResourceKind::VersioningConfig);
        assert!(r.applies_to(&kinds));
    }
}
