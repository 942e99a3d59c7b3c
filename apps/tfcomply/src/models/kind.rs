//! Resource kinds recognized by the classifier.
//!
//! The builtin variants cover the AWS declarations the builtin rules look
//! at. Rules files may introduce further kinds, which land in `Custom`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// A recognized category of declared infrastructure resource.
pub enum ResourceKind {
    StorageBucket,
    EncryptionConfig,
    PublicAccessBlock,
    KeyManagementKey,
    AuditTrail,
    VersioningConfig,
    LoggingConfig,
    ReplicationConfig,
    ObjectLock,
    AccessPolicy,
    LifecycleConfig,
    Custom(String),
}

impl ResourceKind {
    pub const BUILTIN: [ResourceKind; 11] = [
        ResourceKind::StorageBucket,
        ResourceKind::EncryptionConfig,
        ResourceKind::PublicAccessBlock,
        ResourceKind::KeyManagementKey,
        ResourceKind::AuditTrail,
        ResourceKind::VersioningConfig,
        ResourceKind::LoggingConfig,
        ResourceKind::ReplicationConfig,
        ResourceKind::ObjectLock,
        ResourceKind::AccessPolicy,
        ResourceKind::LifecycleConfig,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::StorageBucket => "storage_bucket",
            ResourceKind::EncryptionConfig => "encryption_config",
            ResourceKind::PublicAccessBlock => "public_access_block",
            ResourceKind::KeyManagementKey => "key_management_key",
            ResourceKind::AuditTrail => "audit_trail",
            ResourceKind::VersioningConfig => "versioning_config",
            ResourceKind::LoggingConfig => "logging_config",
            ResourceKind::ReplicationConfig => "replication_config",
            ResourceKind::ObjectLock => "object_lock",
            ResourceKind::AccessPolicy => "access_policy",
            ResourceKind::LifecycleConfig => "lifecycle_config",
            ResourceKind::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, ResourceKind::Custom(_))
    }
}

impl From<String> for ResourceKind {
    fn from(name: String) -> Self {
        ResourceKind::BUILTIN
            .into_iter()
            .find(|k| k.as_str() == name)
            .unwrap_or(ResourceKind::Custom(name))
    }
}

impl From<&str> for ResourceKind {
    fn from(name: &str) -> Self {
        ResourceKind::from(name.to_string())
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_resolve_to_variants() {
        for kind in ResourceKind::BUILTIN {
            assert_eq!(ResourceKind::from(kind.as_str()), kind);
        }
        assert_eq!(
            ResourceKind::from("dynamodb_table"),
            ResourceKind::Custom("dynamodb_table".into())
        );
    }

    #[test]
    fn test_serde_uses_plain_names() {
        let json = serde_json::to_string(&ResourceKind::ObjectLock).unwrap();
        assert_eq!(json, "\"object_lock\"");
        let back: ResourceKind = serde_json::from_str("\"rds_cluster\"").unwrap();
        assert!(!back.is_builtin());
    }
}
