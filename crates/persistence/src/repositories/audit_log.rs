//! Audit log repository for database operations.
//!
//! The table is append-only: this repository issues INSERT and SELECT
//! statements only.

use async_trait::async_trait;
use domain::models::{
    AuditActor, AuditLogCriteria, AuditLogEntry, NewAuditLogEntry, Snapshot,
};
use domain::services::AuditLogStore;
use domain::StoreError;
use serde_json::Value as JsonValue;
use shared::pagination::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::store_error;
use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

const SELECT_COLUMNS: &str = r#"
    id, organization_id, actor_email, actor_display_name, action, target_type,
    target_id, target_name, before_data, after_data, change_summary,
    ip_address, user_agent, session_id, metadata, created_at
"#;

/// Helper struct for building dynamic WHERE clauses from audit log criteria.
/// Tracks conditions and parameter positions so list and count share them.
struct AuditLogFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl AuditLogFilterBuilder {
    /// `$1` is always the organization id.
    fn build(criteria: &AuditLogCriteria) -> Self {
        let mut conditions = vec!["organization_id = $1".to_string()];
        let mut param_count = 1;

        if criteria.action.is_some() {
            param_count += 1;
            conditions.push(format!("action = ${}", param_count));
        }

        if criteria.target_type.is_some() {
            param_count += 1;
            conditions.push(format!("target_type = ${}", param_count));
        }

        if criteria.actor_email.is_some() {
            param_count += 1;
            conditions.push(format!("actor_email = ${}", param_count));
        }

        if criteria.start_date.is_some() {
            param_count += 1;
            conditions.push(format!("created_at >= ${}", param_count));
        }

        if criteria.end_date.is_some() {
            param_count += 1;
            conditions.push(format!("created_at <= ${}", param_count));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    fn param_count(&self) -> i32 {
        self.param_count
    }
}

/// Binds the optional criteria in the order [`AuditLogFilterBuilder`] numbers them.
macro_rules! bind_query_filters {
    ($builder:expr, $criteria:expr) => {{
        let mut b = $builder;
        if let Some(action) = $criteria.action {
            b = b.bind(action.as_str());
        }
        if let Some(target_type) = $criteria.target_type {
            b = b.bind(target_type.as_str());
        }
        if let Some(ref actor_email) = $criteria.actor_email {
            b = b.bind(actor_email);
        }
        if let Some(start_date) = $criteria.start_date {
            b = b.bind(start_date);
        }
        if let Some(end_date) = $criteria.end_date {
            b = b.bind(end_date);
        }
        b
    }};
}

/// PostgreSQL audit log store.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for AuditLogRepository {
    async fn insert(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, StoreError> {
        let timer = QueryTimer::new("insert_audit_log");
        let query = format!(
            r#"
            INSERT INTO org_chart_audit_logs (
                organization_id, actor_email, actor_display_name, action, target_type,
                target_id, target_name, before_data, after_data, change_summary,
                ip_address, user_agent, session_id, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let result = sqlx::query_as::<_, AuditLogEntity>(&query)
            .bind(&entry.organization_id)
            .bind(&entry.actor.email)
            .bind(&entry.actor.display_name)
            .bind(entry.action.as_str())
            .bind(entry.target_type.as_str())
            .bind(&entry.target_id)
            .bind(&entry.target_name)
            .bind(entry.before_data.map(JsonValue::Object))
            .bind(entry.after_data.map(JsonValue::Object))
            .bind(&entry.change_summary)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(&entry.session_id)
            .bind(entry.metadata.map(JsonValue::Object))
            .fetch_one(&self.pool)
            .await;
        timer.record();

        entity_to_domain(result.map_err(store_error)?)
    }

    async fn query(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
        page: PageRequest,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        let filter = AuditLogFilterBuilder::build(criteria);
        let list_query = format!(
            r#"
            SELECT {}
            FROM org_chart_audit_logs
            WHERE {}
            ORDER BY created_at DESC, id DESC
            LIMIT ${} OFFSET ${}
            "#,
            SELECT_COLUMNS,
            filter.where_clause(),
            filter.param_count() + 1,
            filter.param_count() + 2
        );

        let timer = QueryTimer::new("list_audit_logs");
        let list_builder =
            sqlx::query_as::<_, AuditLogEntity>(&list_query).bind(organization_id);
        let list_builder = bind_query_filters!(list_builder, criteria);
        let result = list_builder
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        result
            .map_err(store_error)?
            .into_iter()
            .map(entity_to_domain)
            .collect()
    }

    async fn count(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
    ) -> Result<i64, StoreError> {
        let filter = AuditLogFilterBuilder::build(criteria);
        let count_query = format!(
            "SELECT COUNT(*) FROM org_chart_audit_logs WHERE {}",
            filter.where_clause()
        );

        let timer = QueryTimer::new("count_audit_logs");
        let count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(organization_id);
        let count_builder = bind_query_filters!(count_builder, criteria);
        let result = count_builder.fetch_one(&self.pool).await;
        timer.record();

        result.map_err(store_error)
    }

    async fn get_by_id(
        &self,
        organization_id: &str,
        id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError> {
        let query = format!(
            "SELECT {} FROM org_chart_audit_logs WHERE id = $1 AND organization_id = $2",
            SELECT_COLUMNS
        );

        let timer = QueryTimer::new("find_audit_log_by_id");
        let result = sqlx::query_as::<_, AuditLogEntity>(&query)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        result.map_err(store_error)?.map(entity_to_domain).transpose()
    }
}

fn json_object(value: Option<JsonValue>) -> Option<Snapshot> {
    match value {
        Some(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

/// Convert entity to domain model.
fn entity_to_domain(entity: AuditLogEntity) -> Result<AuditLogEntry, StoreError> {
    let action = entity
        .action
        .parse()
        .map_err(|e: String| StoreError::Backend(e))?;
    let target_type = entity
        .target_type
        .parse()
        .map_err(|e: String| StoreError::Backend(e))?;

    Ok(AuditLogEntry {
        id: entity.id,
        organization_id: entity.organization_id,
        actor: AuditActor {
            email: entity.actor_email,
            display_name: entity.actor_display_name,
        },
        action,
        target_type,
        target_id: entity.target_id,
        target_name: entity.target_name,
        before_data: json_object(entity.before_data),
        after_data: json_object(entity.after_data),
        change_summary: entity.change_summary,
        ip_address: entity.ip_address,
        user_agent: entity.user_agent,
        session_id: entity.session_id,
        metadata: json_object(entity.metadata),
        created_at: entity.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{AuditAction, TargetType};

    fn entity() -> AuditLogEntity {
        AuditLogEntity {
            id: Uuid::new_v4(),
            organization_id: "org_test".to_string(),
            actor_email: "admin@example.com".to_string(),
            actor_display_name: "Admin".to_string(),
            action: "update".to_string(),
            target_type: "employee".to_string(),
            target_id: Some("e-1".to_string()),
            target_name: Some("Taro".to_string()),
            before_data: Some(serde_json::json!({"position": "Dev"})),
            after_data: Some(serde_json::json!({"position": "Lead"})),
            change_summary: "Employee Taro was updated (Position)".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            session_id: Some("sess_1_abc".to_string()),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain_conversion() {
        let entry = entity_to_domain(entity()).unwrap();

        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.target_type, TargetType::Employee);
        assert_eq!(entry.actor.display_name, "Admin");
        assert_eq!(entry.before_data.unwrap()["position"], "Dev");
        assert!(entry.metadata.is_none());
    }

    #[test]
    fn test_entity_with_unknown_action_is_rejected() {
        let mut row = entity();
        row.action = "archive".to_string();

        assert!(matches!(entity_to_domain(row), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_non_object_snapshot_dropped() {
        let mut row = entity();
        row.after_data = Some(serde_json::json!("not an object"));

        assert!(entity_to_domain(row).unwrap().after_data.is_none());
    }

    #[test]
    fn test_filter_builder_without_criteria() {
        let filter = AuditLogFilterBuilder::build(&AuditLogCriteria::default());

        assert_eq!(filter.where_clause(), "organization_id = $1");
        assert_eq!(filter.param_count(), 1);
    }

    #[test]
    fn test_filter_builder_numbers_params_in_bind_order() {
        let criteria = AuditLogCriteria {
            action: Some(AuditAction::Delete),
            actor_email: Some("a@example.com".to_string()),
            end_date: Some(Utc::now()),
            ..Default::default()
        };

        let filter = AuditLogFilterBuilder::build(&criteria);

        assert_eq!(
            filter.where_clause(),
            "organization_id = $1 AND action = $2 AND actor_email = $3 AND created_at <= $4"
        );
        assert_eq!(filter.param_count(), 4);
    }
}
