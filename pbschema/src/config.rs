//! Diff engine configuration.

use serde::{Deserialize, Serialize};

/// PocketBase internal collections that are never created or deleted.
pub const DEFAULT_SYSTEM_COLLECTIONS: &[&str] = &["_mfas", "_otps", "_externalAuths", "_authOrigins", "_superusers"];

/// Server-managed fields of the `users` auth collection.
pub const DEFAULT_USERS_SYSTEM_FIELDS: &[&str] = &[
    "id",
    "password",
    "tokenKey",
    "email",
    "emailVisibility",
    "verified",
    "created",
    "updated",
];

/// Severity of a destructive change, ordered `Low < Medium < High`.
///
/// Used as a threshold it selects that severity and everything above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    #[default]
    High,
}

impl Severity {
    /// Whether a change of `severity` is surfaced when `self` is the threshold.
    pub fn includes(&self, severity: Severity) -> bool {
        severity >= *self
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffEngineConfig {
    /// Print warnings for collection and field deletions
    pub warn_on_delete: bool,
    /// Require an explicit force flag when destructive changes are present
    pub require_force_for_destructive: bool,
    pub severity_threshold: Severity,
    pub system_collections: Vec<String>,
    pub users_system_fields: Vec<String>,
}

impl Default for DiffEngineConfig {
    fn default() -> Self {
        Self {
            warn_on_delete: true,
            require_force_for_destructive: true,
            severity_threshold: Severity::High,
            system_collections: DEFAULT_SYSTEM_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
            users_system_fields: DEFAULT_USERS_SYSTEM_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiffEngineConfig {
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.severity_threshold = threshold;
        self
    }

    /// Exact-case membership check.
    pub fn is_system_collection(&self, name: &str) -> bool {
        self.system_collections.iter().any(|c| c == name)
    }

    pub fn is_users_system_field(&self, name: &str) -> bool {
        self.users_system_fields.iter().any(|f| f == name)
    }
}
