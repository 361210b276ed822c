//! Domain error types.

use thiserror::Error;

use crate::models::{AuditAction, TargetType};

/// Failures reported by storage collaborators (audit store, entity repositories).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("operation timed out")]
    Timeout,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures of the network origin lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("origin lookup timed out")]
    Timeout,

    #[error("origin lookup failed: {0}")]
    Failed(String),
}

/// Errors surfaced by the audit recorder, query service and rollback engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("feature is disabled")]
    FeatureDisabled,

    #[error("authentication required")]
    Unauthenticated,

    #[error("audit log entry not found")]
    NotFound,

    #[error("action '{0}' cannot be rolled back")]
    UnsupportedAction(AuditAction),

    #[error("target type '{0}' cannot be rolled back")]
    UnsupportedTargetType(TargetType),

    #[error("entry has no snapshot to roll back to")]
    MissingSnapshot,

    #[error("entry has no target id")]
    MissingTargetId,

    #[error("current entity state diverged: {0}")]
    Conflict(String),

    #[error("invalid audit entry: {0}")]
    InvalidEntry(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),
}

impl AuditError {
    /// Stable machine-readable code used in API responses and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::FeatureDisabled => "feature_disabled",
            AuditError::Unauthenticated => "unauthenticated",
            AuditError::NotFound => "not_found",
            AuditError::UnsupportedAction(_) => "unsupported_action",
            AuditError::UnsupportedTargetType(_) => "unsupported_target_type",
            AuditError::MissingSnapshot => "missing_snapshot",
            AuditError::MissingTargetId => "missing_target_id",
            AuditError::Conflict(_) => "conflict",
            AuditError::InvalidEntry(_) => "invalid_entry",
            AuditError::StorageFailure(_) => "storage_failure",
            AuditError::NetworkFailure(_) => "network_failure",
        }
    }
}

impl From<StoreError> for AuditError {
    fn from(err: StoreError) -> Self {
        AuditError::StorageFailure(err.to_string())
    }
}

impl From<LookupError> for AuditError {
    fn from(err: LookupError) -> Self {
        AuditError::NetworkFailure(err.to_string())
    }
}
