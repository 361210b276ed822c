//! Audit log domain models.
//!
//! An [`AuditLogEntry`] is the immutable record of one action against an org
//! chart entity, carrying the entity snapshots from just before and just after
//! the action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;
use uuid::Uuid;

/// Ordered mapping of field name to value describing an entity at one instant.
pub type Snapshot = Map<String, JsonValue>;

/// Free-form, action-specific context attached to an entry.
pub type Metadata = Map<String, JsonValue>;

/// Metadata key referencing the entry a rollback reverses.
pub const ORIGINAL_ENTRY_ID_KEY: &str = "originalEntryId";

/// Metadata key recording the action a rollback reversed.
pub const ORIGINAL_ACTION_KEY: &str = "originalAction";

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Rollback,
    Login,
    Logout,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::Rollback,
        AuditAction::Login,
        AuditAction::Logout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Rollback => "rollback",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
        }
    }

    /// Mutations that carry snapshots and can be reversed.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            AuditAction::Create | AuditAction::Update | AuditAction::Delete
        )
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            "rollback" => Ok(AuditAction::Rollback),
            "login" => Ok(AuditAction::Login),
            "logout" => Ok(AuditAction::Logout),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of entities an entry can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Employee,
    Department,
    Role,
    Editor,
    System,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Employee => "employee",
            TargetType::Department => "department",
            TargetType::Role => "role",
            TargetType::Editor => "editor",
            TargetType::System => "system",
        }
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(TargetType::Employee),
            "department" => Ok(TargetType::Department),
            "role" => Ok(TargetType::Role),
            "editor" => Ok(TargetType::Editor),
            "system" => Ok(TargetType::System),
            _ => Err(format!("Unknown target type: {}", s)),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated operator an entry is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub email: String,
    pub display_name: String,
}

impl AuditActor {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
        }
    }
}

/// Persisted audit log entry. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub organization_id: String,
    pub actor: AuditActor,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub before_data: Option<Snapshot>,
    pub after_data: Option<Snapshot>,
    pub change_summary: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// For rollback entries, the id of the entry that was reversed.
    pub fn original_entry_id(&self) -> Option<Uuid> {
        original_entry_id(self.metadata.as_ref())
    }

    /// Builds the persisted form of a new entry once the store has assigned
    /// its identity.
    pub fn from_new(new: NewAuditLogEntry, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            organization_id: new.organization_id,
            actor: new.actor,
            action: new.action,
            target_type: new.target_type,
            target_id: new.target_id,
            target_name: new.target_name,
            before_data: new.before_data,
            after_data: new.after_data,
            change_summary: new.change_summary,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            session_id: new.session_id,
            metadata: new.metadata,
            created_at,
        }
    }
}

pub(crate) fn original_entry_id(metadata: Option<&Metadata>) -> Option<Uuid> {
    metadata
        .and_then(|m| m.get(ORIGINAL_ENTRY_ID_KEY))
        .and_then(JsonValue::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// A fully populated entry waiting for the store to assign `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLogEntry {
    pub organization_id: String,
    pub actor: AuditActor,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub before_data: Option<Snapshot>,
    pub after_data: Option<Snapshot>,
    pub change_summary: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Caller-supplied description of an action to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAuditInput {
    pub action: AuditAction,
    pub target_type: TargetType,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_name: Option<String>,
    #[serde(default)]
    pub before_data: Option<Snapshot>,
    #[serde(default)]
    pub after_data: Option<Snapshot>,
    #[serde(default)]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl RecordAuditInput {
    pub fn new(action: AuditAction, target_type: TargetType) -> Self {
        Self {
            action,
            target_type,
            target_id: None,
            target_name: None,
            before_data: None,
            after_data: None,
            change_summary: None,
            metadata: None,
        }
    }

    pub fn with_target_id(mut self, id: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    pub fn with_target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    pub fn with_before(mut self, before: Snapshot) -> Self {
        self.before_data = Some(before);
        self
    }

    pub fn with_after(mut self, after: Snapshot) -> Self {
        self.after_data = Some(after);
        self
    }

    pub fn with_change_summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = Some(summary.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Checks the structural invariants every persisted entry must satisfy.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.action.is_mutation() && self.before_data.is_none() && self.after_data.is_none() {
            return Err(format!(
                "{} entries must carry at least one snapshot",
                self.action
            ));
        }
        if self.action == AuditAction::Rollback
            && original_entry_id(self.metadata.as_ref()).is_none()
        {
            return Err(format!(
                "rollback entries must reference the reversed entry via metadata.{}",
                ORIGINAL_ENTRY_ID_KEY
            ));
        }
        Ok(())
    }
}

/// Conjunctive filters over persisted entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogCriteria {
    pub action: Option<AuditAction>,
    pub target_type: Option<TargetType>,
    pub actor_email: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditLogCriteria {
    /// Whether an entry satisfies every set filter. Tenant scoping is applied
    /// separately by the store.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.action.map_or(true, |a| entry.action == a)
            && self.target_type.map_or(true, |t| entry.target_type == t)
            && self
                .actor_email
                .as_deref()
                .map_or(true, |email| entry.actor.email == email)
            && self.start_date.map_or(true, |from| entry.created_at >= from)
            && self.end_date.map_or(true, |to| entry.created_at <= to)
    }
}

/// Query parameters for listing audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditLogsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<AuditAction>,
    pub target_type: Option<TargetType>,
    pub actor_email: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ListAuditLogsQuery {
    pub fn criteria(&self) -> AuditLogCriteria {
        AuditLogCriteria {
            action: self.action,
            target_type: self.target_type,
            actor_email: self.actor_email.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(action: AuditAction, email: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            organization_id: "org_test".to_string(),
            actor: AuditActor::new(email, "Tester"),
            action,
            target_type: TargetType::Employee,
            target_id: Some("e-1".to_string()),
            target_name: Some("Taro".to_string()),
            before_data: None,
            after_data: Some(Snapshot::new()),
            change_summary: String::new(),
            ip_address: None,
            user_agent: None,
            session_id: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_audit_action_from_str() {
        assert_eq!(AuditAction::from_str("create").unwrap(), AuditAction::Create);
        assert_eq!(AuditAction::from_str("ROLLBACK").unwrap(), AuditAction::Rollback);
        assert!(AuditAction::from_str("read").is_err());
    }

    #[test]
    fn test_audit_action_display_round_trips() {
        for action in AuditAction::ALL {
            assert_eq!(AuditAction::from_str(&action.to_string()).unwrap(), action);
        }
    }

    #[test]
    fn test_is_mutation() {
        assert!(AuditAction::Update.is_mutation());
        assert!(!AuditAction::Rollback.is_mutation());
        assert!(!AuditAction::Login.is_mutation());
    }

    #[test]
    fn test_target_type_from_str() {
        assert_eq!(TargetType::from_str("department").unwrap(), TargetType::Department);
        assert!(TargetType::from_str("device").is_err());
    }

    #[test]
    fn test_mutation_without_snapshot_violates_invariants() {
        let input = RecordAuditInput::new(AuditAction::Update, TargetType::Employee);
        assert!(input.check_invariants().is_err());

        let input = input.with_before(Snapshot::new());
        assert!(input.check_invariants().is_ok());
    }

    #[test]
    fn test_rollback_requires_original_entry_reference() {
        let input = RecordAuditInput::new(AuditAction::Rollback, TargetType::Department);
        assert!(input.check_invariants().is_err());

        let mut metadata = Metadata::new();
        metadata.insert(
            ORIGINAL_ENTRY_ID_KEY.to_string(),
            json!(Uuid::new_v4().to_string()),
        );
        assert!(input.with_metadata(metadata).check_invariants().is_ok());
    }

    #[test]
    fn test_login_needs_no_snapshot() {
        let input = RecordAuditInput::new(AuditAction::Login, TargetType::System);
        assert!(input.check_invariants().is_ok());
    }

    #[test]
    fn test_criteria_are_conjunctive() {
        let e = entry(AuditAction::Create, "a@example.com");

        let criteria = AuditLogCriteria {
            action: Some(AuditAction::Create),
            actor_email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(criteria.matches(&e));

        let criteria = AuditLogCriteria {
            action: Some(AuditAction::Create),
            actor_email: Some("b@example.com".to_string()),
            ..Default::default()
        };
        assert!(!criteria.matches(&e));
    }

    #[test]
    fn test_criteria_date_bounds_are_inclusive() {
        let e = entry(AuditAction::Delete, "a@example.com");
        let criteria = AuditLogCriteria {
            start_date: Some(e.created_at),
            end_date: Some(e.created_at),
            ..Default::default()
        };
        assert!(criteria.matches(&e));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let e = entry(AuditAction::Update, "a@example.com");
        let json = serde_json::to_value(&e).unwrap();

        assert_eq!(json["action"], "update");
        assert_eq!(json["targetType"], "employee");
        assert_eq!(json["actor"]["displayName"], "Tester");
        assert!(json.get("changeSummary").is_some());
    }

    #[test]
    fn test_record_input_deserializes_with_defaults() {
        let input: RecordAuditInput = serde_json::from_value(json!({
            "action": "delete",
            "targetType": "department",
            "beforeData": {"name": "Sales"}
        }))
        .unwrap();

        assert_eq!(input.action, AuditAction::Delete);
        assert!(input.after_data.is_none());
        assert_eq!(input.before_data.unwrap()["name"], "Sales");
    }
}
