//! Display labels used when rendering change summaries.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::{AuditAction, TargetType};

/// Language of generated change summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

struct LabelTable {
    fields: HashMap<&'static str, &'static str>,
    targets: HashMap<TargetType, &'static str>,
    verbs: HashMap<AuditAction, &'static str>,
    unnamed: &'static str,
}

lazy_static! {
    static ref EN: LabelTable = LabelTable {
        fields: HashMap::from([
            ("name", "Name"),
            ("email", "Email"),
            ("department_id", "Department"),
            ("position", "Position"),
            ("role_id", "Role ID"),
            ("employment_type", "Employment type"),
            ("chatwork_account_id", "ChatWork ID"),
            ("departments", "Concurrent departments"),
            ("parent_id", "Parent department"),
            ("level", "Level"),
        ]),
        targets: HashMap::from([
            (TargetType::Employee, "Employee"),
            (TargetType::Department, "Department"),
            (TargetType::Role, "Role"),
            (TargetType::Editor, "Editor"),
            (TargetType::System, "System"),
        ]),
        verbs: HashMap::from([
            (AuditAction::Create, "created"),
            (AuditAction::Update, "updated"),
            (AuditAction::Delete, "deleted"),
            (AuditAction::Rollback, "rolled back"),
            (AuditAction::Login, "logged in"),
            (AuditAction::Logout, "logged out"),
        ]),
        unnamed: "(unnamed)",
    };
    static ref JA: LabelTable = LabelTable {
        fields: HashMap::from([
            ("name", "名前"),
            ("email", "メール"),
            ("department_id", "部署"),
            ("position", "役職"),
            ("role_id", "役職ID"),
            ("employment_type", "雇用形態"),
            ("chatwork_account_id", "ChatWork ID"),
            ("departments", "兼務先"),
            ("parent_id", "親部署"),
            ("level", "レベル"),
        ]),
        targets: HashMap::from([
            (TargetType::Employee, "社員"),
            (TargetType::Department, "部署"),
            (TargetType::Role, "役職"),
            (TargetType::Editor, "編集者"),
            (TargetType::System, "システム"),
        ]),
        verbs: HashMap::from([
            (AuditAction::Create, "追加"),
            (AuditAction::Update, "更新"),
            (AuditAction::Delete, "削除"),
            (AuditAction::Rollback, "ロールバック"),
            (AuditAction::Login, "ログイン"),
            (AuditAction::Logout, "ログアウト"),
        ]),
        unnamed: "(名前なし)",
    };
}

impl Locale {
    fn table(&self) -> &'static LabelTable {
        match self {
            Locale::En => &EN,
            Locale::Ja => &JA,
        }
    }

    /// Display label for a field, falling back to the raw field name.
    pub fn field_label<'a>(&self, field: &'a str) -> &'a str {
        self.table().fields.get(field).copied().unwrap_or(field)
    }

    pub fn target_label(&self, target_type: TargetType) -> &'static str {
        self.table()
            .targets
            .get(&target_type)
            .copied()
            .unwrap_or_else(|| target_type.as_str())
    }

    pub fn action_verb(&self, action: AuditAction) -> &'static str {
        self.table()
            .verbs
            .get(&action)
            .copied()
            .unwrap_or_else(|| action.as_str())
    }

    pub fn unnamed(&self) -> &'static str {
        self.table().unnamed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_target_and_action_has_a_label() {
        for locale in [Locale::En, Locale::Ja] {
            for action in AuditAction::ALL {
                assert_ne!(locale.action_verb(action), action.as_str());
            }
            for target in [
                TargetType::Employee,
                TargetType::Department,
                TargetType::Role,
                TargetType::Editor,
                TargetType::System,
            ] {
                assert!(!locale.target_label(target).is_empty());
            }
        }
    }

    #[test]
    fn test_unknown_field_falls_back_to_raw_name() {
        assert_eq!(Locale::En.field_label("nickname"), "nickname");
        assert_eq!(Locale::Ja.field_label("email"), "メール");
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!(Locale::from_str("JA").unwrap(), Locale::Ja);
        assert!(Locale::from_str("fr").is_err());
    }
}
