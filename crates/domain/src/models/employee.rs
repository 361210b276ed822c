//! Employee domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::audit_log::{Snapshot, TargetType};
use super::AuditSubject;

/// An employee record as seen by the org chart.
///
/// Only the identity fields are typed. Everything else is kept verbatim in
/// `extra`, whatever shape the entity store uses for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Snapshot,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            extra: Snapshot::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl AuditSubject for Employee {
    const TARGET_TYPE: TargetType = TargetType::Employee;

    fn subject_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn subject_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn to_snapshot(&self) -> Snapshot {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Snapshot::new(),
        }
    }
}
