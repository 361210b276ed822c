//! Snapshot differ.
//!
//! Computes which fields changed between two entity snapshots and renders the
//! human-readable change summary stored on each audit log entry.
//!
//! Values are compared by their canonical JSON form: object keys are sorted
//! recursively before serializing, so key order inside nested objects never
//! counts as a change. A key that is absent on one side and `null` on the
//! other does count as a change.

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::labels::Locale;
use crate::models::{AuditAction, Snapshot, TargetType};

/// System-managed fields that are never reported as changed.
pub const SYSTEM_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "updated_at",
    "createdAt",
    "updatedAt",
    "department_order",
    "sort_order",
];

pub fn is_system_field(field: &str) -> bool {
    SYSTEM_FIELDS.contains(&field)
}

/// Serializes a value with object keys sorted at every depth.
pub fn canonical_json(value: &JsonValue) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_default()
}

fn canonicalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            JsonValue::Object(sorted)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn values_equal(a: Option<&JsonValue>, b: Option<&JsonValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => canonical_json(a) == canonical_json(b),
        _ => false,
    }
}

/// Raw names of the non-system fields whose values differ, in the order the
/// keys first appear in `before` then `after`.
pub fn changed_field_keys<'a>(
    before: Option<&'a Snapshot>,
    after: Option<&'a Snapshot>,
) -> Vec<&'a str> {
    let empty_before = Snapshot::new();
    let empty_after = Snapshot::new();
    let before_map = before.unwrap_or(&empty_before);
    let after_map = after.unwrap_or(&empty_after);

    let mut changed: Vec<&'a str> = Vec::new();
    let keys = before
        .into_iter()
        .flat_map(|m| m.keys())
        .chain(after.into_iter().flat_map(|m| m.keys()));

    for key in keys {
        let key = key.as_str();
        if is_system_field(key) || changed.contains(&key) {
            continue;
        }
        if !values_equal(before_map.get(key), after_map.get(key)) {
            changed.push(key);
        }
    }
    changed
}

/// Translated labels of the changed fields.
pub fn get_changed_fields(
    before: Option<&Snapshot>,
    after: Option<&Snapshot>,
    locale: Locale,
) -> Vec<String> {
    changed_field_keys(before, after)
        .into_iter()
        .map(|key| locale.field_label(key).to_string())
        .collect()
}

/// Whether two snapshots carry the same non-system content.
pub fn snapshots_equivalent(a: Option<&Snapshot>, b: Option<&Snapshot>) -> bool {
    changed_field_keys(a, b).is_empty()
}

/// Renders the summary sentence for an action.
///
/// Updates list the changed fields when both snapshots are present and at
/// least one field differs.
pub fn generate_change_summary(
    locale: Locale,
    action: AuditAction,
    target_type: TargetType,
    target_name: Option<&str>,
    before: Option<&Snapshot>,
    after: Option<&Snapshot>,
) -> String {
    let type_label = locale.target_label(target_type);
    let name = target_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| locale.unnamed());
    let verb = locale.action_verb(action);

    let fields = match (action, before, after) {
        (AuditAction::Update, Some(_), Some(_)) => get_changed_fields(before, after, locale),
        _ => Vec::new(),
    };

    match locale {
        Locale::En => {
            let mut summary = format!("{} {} was {}", type_label, name, verb);
            if !fields.is_empty() {
                summary.push_str(&format!(" ({})", fields.join(", ")));
            }
            summary
        }
        Locale::Ja => {
            let mut summary = format!("{}「{}」を{}", type_label, name, verb);
            if !fields.is_empty() {
                summary.push_str(&format!("（{}）", fields.join("、")));
            }
            summary
        }
    }
}

/// Summary stored on the entry produced by a rollback.
pub fn rollback_summary(locale: Locale, original_entry_id: Uuid) -> String {
    match locale {
        Locale::En => format!("Rolled back audit log {}", original_entry_id),
        Locale::Ja => format!("監査ログ {} からロールバック", original_entry_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: JsonValue) -> Snapshot {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("snapshot fixtures must be objects"),
        }
    }

    #[test]
    fn test_single_changed_field() {
        let before = snapshot(json!({"name": "A", "role": "x"}));
        let after = snapshot(json!({"name": "A", "role": "y"}));

        let fields = get_changed_fields(Some(&before), Some(&after), Locale::En);

        assert_eq!(fields, vec!["role".to_string()]);
    }

    #[test]
    fn test_key_insertion_order_does_not_matter() {
        let before = snapshot(json!({"role": "x", "name": "A"}));
        let after = snapshot(json!({"name": "A", "role": "y"}));

        assert_eq!(changed_field_keys(Some(&before), Some(&after)), vec!["role"]);
    }

    #[test]
    fn test_nested_key_order_is_insignificant() {
        let before = snapshot(json!({"meta": {"a": 1, "b": 2}}));
        let after = snapshot(json!({"meta": {"b": 2, "a": 1}}));

        assert!(changed_field_keys(Some(&before), Some(&after)).is_empty());
    }

    #[test]
    fn test_system_fields_are_excluded() {
        let before = snapshot(json!({"id": "1", "createdAt": "2024-01-01", "name": "A"}));
        let after = snapshot(json!({"id": "2", "createdAt": "2024-02-02", "name": "A"}));

        assert!(changed_field_keys(Some(&before), Some(&after)).is_empty());

        let before = snapshot(json!({"updated_at": "x", "department_order": 1}));
        let after = snapshot(json!({"updated_at": "y", "department_order": 2}));
        assert!(changed_field_keys(Some(&before), Some(&after)).is_empty());
    }

    #[test]
    fn test_absent_and_null_are_different() {
        let before = snapshot(json!({"name": "A"}));
        let after = snapshot(json!({"name": "A", "position": null}));

        assert_eq!(changed_field_keys(Some(&before), Some(&after)), vec!["position"]);
    }

    #[test]
    fn test_missing_snapshot_treated_as_empty() {
        let after = snapshot(json!({"name": "A", "email": "a@example.com"}));

        assert_eq!(
            get_changed_fields(None, Some(&after), Locale::En),
            vec!["Name".to_string(), "Email".to_string()]
        );
        assert!(get_changed_fields(None, None, Locale::En).is_empty());
    }

    #[test]
    fn test_order_follows_before_then_after_keys() {
        let before = snapshot(json!({"position": "Lead", "email": "a@x"}));
        let after = snapshot(json!({"email": "b@x", "level": 3, "position": "Manager"}));

        assert_eq!(
            changed_field_keys(Some(&before), Some(&after)),
            vec!["position", "email", "level"]
        );
    }

    #[test]
    fn test_update_summary_lists_fields() {
        let before = snapshot(json!({"name": "Alice", "position": "Dev", "email": "a@x"}));
        let after = snapshot(json!({"name": "Alice", "position": "Lead", "email": "b@x"}));

        let summary = generate_change_summary(
            Locale::En,
            AuditAction::Update,
            TargetType::Employee,
            Some("Alice"),
            Some(&before),
            Some(&after),
        );

        assert_eq!(summary, "Employee Alice was updated (Position, Email)");
    }

    #[test]
    fn test_update_summary_without_changes_omits_field_list() {
        let same = snapshot(json!({"name": "Sales"}));

        let summary = generate_change_summary(
            Locale::En,
            AuditAction::Update,
            TargetType::Department,
            Some("Sales"),
            Some(&same),
            Some(&same),
        );

        assert_eq!(summary, "Department Sales was updated");
    }

    #[test]
    fn test_create_summary_uses_unnamed_placeholder() {
        let summary = generate_change_summary(
            Locale::En,
            AuditAction::Create,
            TargetType::Employee,
            None,
            None,
            None,
        );

        assert_eq!(summary, "Employee (unnamed) was created");
    }

    #[test]
    fn test_japanese_summary() {
        let before = snapshot(json!({"name": "田中", "email": "a@x"}));
        let after = snapshot(json!({"name": "田中太郎", "email": "b@x"}));

        let summary = generate_change_summary(
            Locale::Ja,
            AuditAction::Update,
            TargetType::Employee,
            Some("田中太郎"),
            Some(&before),
            Some(&after),
        );

        assert_eq!(summary, "社員「田中太郎」を更新（名前、メール）");
    }

    #[test]
    fn test_rollback_summary() {
        let id = Uuid::nil();
        assert_eq!(
            rollback_summary(Locale::En, id),
            format!("Rolled back audit log {}", id)
        );
        assert!(rollback_summary(Locale::Ja, id).ends_with("からロールバック"));
    }

    #[test]
    fn test_snapshots_equivalent_ignores_system_fields() {
        let a = snapshot(json!({"id": "1", "name": "A"}));
        let b = snapshot(json!({"id": "9", "name": "A"}));
        assert!(snapshots_equivalent(Some(&a), Some(&b)));
        assert!(!snapshots_equivalent(Some(&a), None));
    }
}
