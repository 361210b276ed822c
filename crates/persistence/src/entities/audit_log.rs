//! Audit log entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row of `org_chart_audit_logs`.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,

    /// Tenant the entry belongs to.
    pub organization_id: String,

    pub actor_email: String,
    pub actor_display_name: String,

    /// Audited action (create, update, delete, rollback, login, logout).
    pub action: String,

    /// Kind of entity affected.
    pub target_type: String,

    pub target_id: Option<String>,
    pub target_name: Option<String>,

    /// Entity snapshot before the action.
    pub before_data: Option<serde_json::Value>,

    /// Entity snapshot after the action.
    pub after_data: Option<serde_json::Value>,

    pub change_summary: String,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,

    /// Action-specific context, e.g. the entry a rollback reversed.
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}
