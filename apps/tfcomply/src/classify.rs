//! Resource classifier: which declaration kinds appear in a unit's text.
//!
//! Recognition is a cheap substring/regex test over the raw text. It does
//! not resolve which bucket a configuration belongs to; co-occurrence in
//! one unit is all the evaluator gets.

use crate::models::kind::ResourceKind;
use crate::models::rule::Pattern;
use crate::models::ConfigUnit;
use regex::Regex;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
/// Ordered table of kind recognizers.
pub struct Classifier {
    recognizers: Vec<(ResourceKind, Pattern)>,
}

fn re(src: &str) -> Pattern {
    Pattern::Regex(Regex::new(src).expect("builtin kind: invalid regex"))
}

/// `resource "<ty>"` declaration; the closing quote keeps
/// `aws_s3_bucket` from matching `aws_s3_bucket_versioning`.
fn declared(ty: &str) -> Pattern {
    re(&format!(r#"\bresource\s+"{ty}""#))
}

impl Classifier {
    /// Recognizers for the builtin AWS kinds.
    pub fn builtin() -> Self {
        let recognizers = vec![
            (ResourceKind::StorageBucket, declared("aws_s3_bucket")),
            (
                ResourceKind::EncryptionConfig,
                declared("aws_s3_bucket_server_side_encryption_configuration"),
            ),
            (
                ResourceKind::PublicAccessBlock,
                declared("aws_s3_bucket_public_access_block"),
            ),
            (ResourceKind::KeyManagementKey, declared("aws_kms_key")),
            (ResourceKind::AuditTrail, declared("aws_cloudtrail")),
            (
                ResourceKind::VersioningConfig,
                declared("aws_s3_bucket_versioning"),
            ),
            (ResourceKind::LoggingConfig, declared("aws_s3_bucket_logging")),
            (
                ResourceKind::ReplicationConfig,
                declared("aws_s3_bucket_replication_configuration"),
            ),
            (
                ResourceKind::ObjectLock,
                declared("aws_s3_bucket_object_lock_configuration"),
            ),
            (
                ResourceKind::AccessPolicy,
                re(r#"\b(resource\s+"(aws_s3_bucket_policy|aws_iam_policy)"|data\s+"aws_iam_policy_document")"#),
            ),
            (
                ResourceKind::LifecycleConfig,
                declared("aws_s3_bucket_lifecycle_configuration"),
            ),
        ];
        Classifier { recognizers }
    }

    /// Register an extra kind. Returns false if the kind is already known.
    pub fn add(&mut self, kind: ResourceKind, pattern: Pattern) -> bool {
        if self.knows(&kind) {
            return false;
        }
        self.recognizers.push((kind, pattern));
        true
    }

    pub fn knows(&self, kind: &ResourceKind) -> bool {
        self.recognizers.iter().any(|(k, _)| k == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.recognizers.iter().map(|(k, _)| k)
    }

    /// Kinds whose recognizer matches anywhere in the unit text.
    pub fn classify(&self, unit: &ConfigUnit) -> BTreeSet<ResourceKind> {
        self.recognizers
            .iter()
            .filter(|(_, p)| p.is_match(&unit.text))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::builtin()
    }
}
