//! Rule catalog: the builtin HIPAA rule table, declarative rules files and
//! per-rule overrides from `tfcomply.toml`.
//!
//! Severity policy for the builtin table:
//! - rules bound to a feature's own kind (the feature is declared) report
//!   `error` when a required setting is missing or disabled;
//! - rules bound to `storage_bucket` that only ask for a feature to be
//!   declared report `warning`;
//! - optional hardening (customer-managed keys, MFA delete, CloudWatch)
//!   reports `warning` even when declared.

use crate::classify::Classifier;
use crate::error::CatalogError;
use crate::models::kind::ResourceKind;
use crate::models::rule::{Condition, Dimension, Level, Pattern, Rule};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
/// Immutable, enumerable rule table.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for r in &rules {
            if !seen.insert(r.id.as_str()) {
                return Err(CatalogError::DuplicateRule(r.id.clone()));
            }
        }
        Ok(RuleSet { rules })
    }

    pub fn builtin() -> Self {
        RuleSet {
            rules: builtin_rules(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
/// `[rules.<id>]` table in `tfcomply.toml`.
pub struct RuleOverride {
    pub enabled: Option<bool>,
    pub level: Option<Level>,
}

#[derive(Debug, Clone)]
/// Classifier and rule set built together so rule kinds always resolve.
pub struct Catalog {
    pub classifier: Classifier,
    pub rules: RuleSet,
}

impl Catalog {
    pub fn builtin() -> Self {
        Catalog {
            classifier: Classifier::builtin(),
            rules: RuleSet::builtin(),
        }
    }

    /// Builtin table, extended by `rules_file` when given, then overridden.
    pub fn load(
        rules_file: Option<&Path>,
        overrides: &BTreeMap<String, RuleOverride>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::builtin();
        if let Some(path) = rules_file {
            let s = fs::read_to_string(path).map_err(|source| CatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let file: RulesFile = toml::from_str(&s).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            catalog.extend(file)?;
        }
        catalog.apply_overrides(overrides)?;
        Ok(catalog)
    }

    fn extend(&mut self, file: RulesFile) -> Result<(), CatalogError> {
        for k in file.kinds {
            let owner = format!("kind `{}`", k.name);
            let pattern = k.pattern.build(&owner)?;
            if !self.classifier.add(ResourceKind::from(k.name.clone()), pattern) {
                return Err(CatalogError::DuplicateKind(k.name));
            }
        }
        let mut rules = std::mem::take(&mut self.rules.rules);
        for spec in file.rules {
            rules.push(spec.build(&self.classifier)?);
        }
        self.rules = RuleSet::new(rules)?;
        debug!(rules = self.rules.len(), "rule set extended from rules file");
        Ok(())
    }

    fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, RuleOverride>,
    ) -> Result<(), CatalogError> {
        if let Some(unknown) = overrides.keys().find(|id| self.rules.get(id).is_none()) {
            return Err(CatalogError::UnknownOverride(unknown.clone()));
        }
        self.rules.rules.retain(|r| {
            overrides
                .get(&r.id)
                .and_then(|o| o.enabled)
                .unwrap_or(true)
        });
        for r in self.rules.rules.iter_mut() {
            if let Some(level) = overrides.get(&r.id).and_then(|o| o.level) {
                r.level = level;
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

#[derive(Deserialize)]
struct RulesFile {
    #[serde(default, rename = "kind")]
    kinds: Vec<KindSpec>,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

#[derive(Deserialize)]
struct PatternSpec {
    #[serde(default)]
    literal: Option<String>,
    #[serde(default)]
    regex: Option<String>,
}

impl PatternSpec {
    fn build(self, owner: &str) -> Result<Pattern, CatalogError> {
        match (self.literal, self.regex) {
            (Some(s), None) => Ok(Pattern::Literal(s)),
            (None, Some(src)) => Pattern::regex(&src).map_err(|source| CatalogError::Regex {
                owner: owner.to_string(),
                source,
            }),
            _ => Err(CatalogError::AmbiguousPattern {
                owner: owner.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct KindSpec {
    name: String,
    #[serde(flatten)]
    pattern: PatternSpec,
}

#[derive(Deserialize)]
struct ConditionSpec {
    label: String,
    #[serde(flatten)]
    pattern: PatternSpec,
}

#[derive(Deserialize)]
struct RuleSpec {
    id: String,
    title: String,
    dimension: Dimension,
    kinds: Vec<String>,
    level: Level,
    message: String,
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(default)]
    waiver: Option<PatternSpec>,
    #[serde(default)]
    exempt_units: Option<PatternSpec>,
    #[serde(default, rename = "require")]
    requires: Vec<ConditionSpec>,
}

impl RuleSpec {
    fn build(self, classifier: &Classifier) -> Result<Rule, CatalogError> {
        let owner = format!("rule `{}`", self.id);
        if self.kinds.is_empty() {
            return Err(CatalogError::NoKinds(self.id));
        }
        if self.requires.is_empty() {
            return Err(CatalogError::EmptyRule(self.id));
        }
        let mut kinds = Vec::with_capacity(self.kinds.len());
        for name in self.kinds {
            let kind = ResourceKind::from(name.clone());
            if !classifier.knows(&kind) {
                return Err(CatalogError::UnknownKind {
                    rule: self.id,
                    kind: name,
                });
            }
            kinds.push(kind);
        }
        let mut requires = Vec::with_capacity(self.requires.len());
        for c in self.requires {
            requires.push(Condition::new(c.label, c.pattern.build(&owner)?));
        }
        Ok(Rule {
            waiver: self.waiver.map(|p| p.build(&owner)).transpose()?,
            exempt_units: self.exempt_units.map(|p| p.build(&owner)).transpose()?,
            id: self.id,
            title: self.title,
            dimension: self.dimension,
            kinds,
            requires,
            level: self.level,
            message: self.message,
            recommendation: self.recommendation,
        })
    }
}

fn rx(src: &str) -> Pattern {
    Pattern::Regex(Regex::new(src).expect("builtin rule: invalid regex"))
}

fn cond(label: &str, pattern: Pattern) -> Condition {
    Condition::new(label, pattern)
}

fn rule(
    id: &str,
    title: &str,
    dimension: Dimension,
    kind: ResourceKind,
    level: Level,
    requires: Vec<Condition>,
    message: &str,
) -> Rule {
    Rule {
        id: id.to_string(),
        title: title.to_string(),
        dimension,
        kinds: vec![kind],
        requires,
        level,
        message: message.to_string(),
        recommendation: None,
        waiver: None,
        exempt_units: None,
    }
}

fn recommend(mut r: Rule, text: &str) -> Rule {
    r.recommendation = Some(text.to_string());
    r
}

const STATUS_ENABLED: &str = r#"\bstatus\s*=\s*"Enabled""#;
const VERSIONING_ENABLED: &str =
    r#"\bversioning_configuration\s*\{[^}]*\bstatus\s*=\s*"Enabled""#;

fn builtin_rules() -> Vec<Rule> {
    use Dimension::*;
    use Level::{Error, Warning};
    use ResourceKind as K;

    vec![
        // Encryption at rest
        Rule {
            waiver: Some(Pattern::literal("checkov:skip=CKV_AWS_145")),
            ..recommend(
                rule(
                    "ENC-001",
                    "S3 bucket has server-side encryption configured",
                    EncryptionAtRest,
                    K::StorageBucket,
                    Warning,
                    vec![cond(
                        "server-side encryption configuration",
                        rx(r#"resource\s+"aws_s3_bucket_server_side_encryption_configuration""#),
                    )],
                    "S3 bucket found without separate encryption configuration",
                ),
                "Declare aws_s3_bucket_server_side_encryption_configuration for every PHI bucket",
            )
        },
        rule(
            "ENC-002",
            "S3 encryption uses an approved algorithm",
            EncryptionAtRest,
            K::EncryptionConfig,
            Error,
            vec![
                cond("sse_algorithm", rx(r"\bsse_algorithm\s*=")),
                cond("aws:kms or AES256", rx(r#""(aws:kms(:dsse)?|AES256)""#)),
            ],
            "S3 encryption configuration missing {missing}",
        ),
        recommend(
            rule(
                "ENC-003",
                "S3 encryption uses a customer-managed KMS key",
                EncryptionAtRest,
                K::EncryptionConfig,
                Warning,
                vec![cond("kms_master_key_id", rx(r"\bkms_master_key_id\s*="))],
                "S3 encryption does not reference a customer-managed KMS key",
            ),
            "Set kms_master_key_id to a rotated customer-managed key",
        ),
        // Encryption in transit
        recommend(
            rule(
                "TLS-001",
                "Access policy denies non-TLS requests",
                EncryptionInTransit,
                K::AccessPolicy,
                Warning,
                vec![cond("aws:SecureTransport condition", Pattern::literal("aws:SecureTransport"))],
                "Access policy does not enforce HTTPS (missing {missing})",
            ),
            "Deny s3:* when aws:SecureTransport is false",
        ),
        // Access control
        rule(
            "ACC-001",
            "S3 bucket has a public access block",
            AccessControl,
            K::StorageBucket,
            Warning,
            vec![cond(
                "public access block",
                rx(r#"resource\s+"aws_s3_bucket_public_access_block""#),
            )],
            "S3 bucket declared without a public access block",
        ),
        rule(
            "ACC-002",
            "S3 public access is fully blocked",
            AccessControl,
            K::PublicAccessBlock,
            Error,
            vec![
                cond("block_public_acls", rx(r"\bblock_public_acls\s*=\s*true")),
                cond("block_public_policy", rx(r"\bblock_public_policy\s*=\s*true")),
                cond("ignore_public_acls", rx(r"\bignore_public_acls\s*=\s*true")),
                cond("restrict_public_buckets", rx(r"\brestrict_public_buckets\s*=\s*true")),
            ],
            "Missing public access blocks: {missing}",
        ),
        recommend(
            rule(
                "ACC-003",
                "S3 bucket access is governed by IAM or bucket policy",
                AccessControl,
                K::StorageBucket,
                Warning,
                vec![cond(
                    "IAM or bucket policy",
                    rx(r"\baws_iam_\w+|\baws_s3_bucket_policy\b"),
                )],
                "No IAM policies found alongside S3 bucket",
            ),
            "Implement regular access reviews",
        ),
        // Versioning
        rule(
            "VER-001",
            "S3 bucket has versioning configured",
            Versioning,
            K::StorageBucket,
            Warning,
            vec![cond(
                "versioning configuration",
                rx(r#"resource\s+"aws_s3_bucket_versioning""#),
            )],
            "S3 versioning not configured",
        ),
        rule(
            "VER-002",
            "S3 versioning is enabled",
            Versioning,
            K::VersioningConfig,
            Error,
            vec![cond(r#"status = "Enabled""#, rx(VERSIONING_ENABLED))],
            "S3 versioning declared but not enabled (missing {missing})",
        ),
        recommend(
            rule(
                "VER-003",
                "S3 versioning requires MFA delete",
                Versioning,
                K::VersioningConfig,
                Warning,
                vec![cond("mfa_delete", rx(r#"\bmfa_delete\s*=\s*"?Enabled"?"#))],
                "MFA delete not configured (optional)",
            ),
            "Enable MFA delete for production environments",
        ),
        // Audit logging
        Rule {
            // log buckets do not log to themselves
            exempt_units: Some(rx(r"(?i)log[^/]*$")),
            ..recommend(
                rule(
                    "LOG-001",
                    "S3 bucket has access logging",
                    AuditLogging,
                    K::StorageBucket,
                    Warning,
                    vec![cond(
                        "access logging configuration",
                        rx(r#"resource\s+"aws_s3_bucket_logging""#),
                    )],
                    "Consider enabling S3 access logging",
                ),
                "Ship S3 access logs to a dedicated log bucket",
            )
        },
        rule(
            "LOG-002",
            "S3 access logging has a target bucket",
            AuditLogging,
            K::LoggingConfig,
            Error,
            vec![cond("target_bucket", rx(r"\btarget_bucket\s*="))],
            "S3 access logging declared without {missing}",
        ),
        rule(
            "LOG-003",
            "CloudTrail uses KMS encryption",
            AuditLogging,
            K::AuditTrail,
            Warning,
            vec![cond("kms_key_id", rx(r"\bkms_key_id\s*="))],
            "CloudTrail should use KMS encryption",
        ),
        rule(
            "LOG-004",
            "CloudTrail log file validation is enabled",
            AuditLogging,
            K::AuditTrail,
            Error,
            vec![cond(
                "enable_log_file_validation = true",
                rx(r"\benable_log_file_validation\s*=\s*true"),
            )],
            "CloudTrail log validation must be enabled",
        ),
        // Key rotation
        rule(
            "KMS-001",
            "KMS key rotation is enabled",
            KeyRotation,
            K::KeyManagementKey,
            Error,
            vec![cond(
                "enable_key_rotation = true",
                rx(r"\benable_key_rotation\s*=\s*true"),
            )],
            "KMS key rotation must be enabled for HIPAA compliance",
        ),
        // Lifecycle and retention
        recommend(
            rule(
                "LIF-001",
                "S3 bucket has a lifecycle policy",
                LifecycleRetention,
                K::StorageBucket,
                Warning,
                vec![cond(
                    "lifecycle configuration",
                    rx(r#"resource\s+"aws_s3_bucket_lifecycle_configuration""#),
                )],
                "No lifecycle or retention policy declared for S3 bucket",
            ),
            "Implement data retention policies according to your requirements",
        ),
        rule(
            "LIF-002",
            "S3 lifecycle rules are enabled and act on objects",
            LifecycleRetention,
            K::LifecycleConfig,
            Error,
            vec![
                cond(r#"status = "Enabled""#, rx(STATUS_ENABLED)),
                cond(
                    "expiration or transition action",
                    rx(r"\b(noncurrent_version_)?(expiration|transition)\s*\{"),
                ),
            ],
            "S3 lifecycle configuration incomplete (missing {missing})",
        ),
        // Replication
        rule(
            "REP-001",
            "S3 replication is enabled with a destination",
            Replication,
            K::ReplicationConfig,
            Error,
            vec![
                cond(r#"status = "Enabled""#, rx(STATUS_ENABLED)),
                cond("destination block", rx(r"\bdestination\s*\{")),
            ],
            "S3 replication declared but incomplete (missing {missing})",
        ),
        rule(
            "REP-002",
            "Replicas are encrypted with KMS",
            Replication,
            K::ReplicationConfig,
            Warning,
            vec![cond("replica_kms_key_id", rx(r"\breplica_kms_key_id\s*="))],
            "Replicated objects are not encrypted with a KMS key",
        ),
        // Object immutability
        rule(
            "IMM-001",
            "Object lock has a retention mode and period",
            ObjectImmutability,
            K::ObjectLock,
            Error,
            vec![
                cond("retention mode", rx(r#"\bmode\s*=\s*"(GOVERNANCE|COMPLIANCE)""#)),
                cond("retention period", rx(r"\b(days|years)\s*=\s*\d+")),
            ],
            "S3 object lock declared without {missing}",
        ),
        // Monitoring
        recommend(
            rule(
                "MON-001",
                "CloudTrail streams to CloudWatch Logs",
                Monitoring,
                K::AuditTrail,
                Warning,
                vec![cond(
                    "cloud_watch_logs_group_arn",
                    rx(r"\bcloud_watch_logs_group_arn\s*="),
                )],
                "CloudWatch monitoring not found for CloudTrail",
            ),
            "Enable AWS Config and CloudWatch alarms for continuous compliance monitoring",
        ),
        recommend(
            rule(
                "MON-002",
                "CloudTrail publishes notifications to SNS",
                Monitoring,
                K::AuditTrail,
                Warning,
                vec![cond("sns_topic_name", rx(r"\bsns_topic_name\s*="))],
                "SNS notifications not configured for CloudTrail",
            ),
            "Publish CloudTrail events to an SNS topic so security alerts reach on-call staff",
        ),
    ]
}
