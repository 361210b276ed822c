//! Department domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::audit_log::{Snapshot, TargetType};
use super::AuditSubject;

/// A department node in the org chart tree.
///
/// Tree fields such as `parent_id` or `level` travel untyped in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Snapshot,
}

impl Department {
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

impl AuditSubject for Department {
    const TARGET_TYPE: TargetType = TargetType::Department;

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
