//! Entity repositories over the schemaless `employees` and `departments` tables.

use async_trait::async_trait;
use domain::models::{Snapshot, TargetType};
use domain::services::EntityRepository;
use domain::StoreError;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::store_error;
use crate::entities::EntityRowEntity;
use crate::metrics::QueryTimer;

/// Columns managed by the table itself, never stored inside `data`.
const ROW_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Entity tables known to the rollback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTable {
    Employees,
    Departments,
}

impl EntityTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityTable::Employees => "employees",
            EntityTable::Departments => "departments",
        }
    }

    pub fn for_target(target_type: TargetType) -> Option<Self> {
        match target_type {
            TargetType::Employee => Some(EntityTable::Employees),
            TargetType::Department => Some(EntityTable::Departments),
            _ => None,
        }
    }
}

/// PostgreSQL entity repository for one table.
#[derive(Clone)]
pub struct PgEntityRepository {
    pool: PgPool,
    table: EntityTable,
}

impl PgEntityRepository {
    pub fn new(pool: PgPool, table: EntityTable) -> Self {
        Self { pool, table }
    }

    pub fn employees(pool: PgPool) -> Self {
        Self::new(pool, EntityTable::Employees)
    }

    pub fn departments(pool: PgPool) -> Self {
        Self::new(pool, EntityTable::Departments)
    }

    async fn insert_with_id(&self, id: Uuid, data: &JsonValue) -> Result<Option<Uuid>, StoreError> {
        let query = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING RETURNING id",
            self.table.table_name()
        );
        sqlx::query_scalar::<_, Uuid>(&query)
            .bind(id)
            .bind(data)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn insert_generated(&self, data: &JsonValue) -> Result<Uuid, StoreError> {
        let query = format!(
            "INSERT INTO {} (data) VALUES ($1) RETURNING id",
            self.table.table_name()
        );
        sqlx::query_scalar::<_, Uuid>(&query)
            .bind(data)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }
}

/// Ids that are not UUIDs cannot exist in these tables.
fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::NotFound)
}

/// Domain fields of a snapshot, without the row-managed columns.
fn data_fields(mut snapshot: Snapshot) -> Snapshot {
    for field in ROW_FIELDS {
        snapshot.remove(*field);
    }
    snapshot
}

/// Full snapshot of a row: the row's id and timestamps merged with `data`.
fn row_to_snapshot(row: EntityRowEntity) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert("id".to_string(), JsonValue::String(row.id.to_string()));
    if let JsonValue::Object(data) = row.data {
        for (key, value) in data {
            if !ROW_FIELDS.contains(&key.as_str()) {
                snapshot.insert(key, value);
            }
        }
    }
    snapshot.insert(
        "created_at".to_string(),
        JsonValue::String(row.created_at.to_rfc3339()),
    );
    snapshot.insert(
        "updated_at".to_string(),
        JsonValue::String(row.updated_at.to_rfc3339()),
    );
    snapshot
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn get(&self, id: &str) -> Result<Snapshot, StoreError> {
        let id = parse_id(id)?;
        let query = format!(
            "SELECT id, data, created_at, updated_at FROM {} WHERE id = $1",
            self.table.table_name()
        );

        let timer = QueryTimer::new("get_entity");
        let result = sqlx::query_as::<_, EntityRowEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        result
            .map_err(store_error)?
            .map(row_to_snapshot)
            .ok_or(StoreError::NotFound)
    }

    /// Reuses the snapshot's `id` when it is a free UUID, otherwise lets the
    /// database assign one.
    async fn create(&self, snapshot: Snapshot) -> Result<String, StoreError> {
        let requested_id = snapshot
            .get("id")
            .and_then(JsonValue::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        let data = JsonValue::Object(data_fields(snapshot));

        let timer = QueryTimer::new("create_entity");
        let reused = match requested_id {
            Some(id) => self.insert_with_id(id, &data).await,
            None => Ok(None),
        };
        let result = match reused {
            Ok(Some(id)) => Ok(id),
            Ok(None) => self.insert_generated(&data).await,
            Err(e) => Err(e),
        };
        timer.record();

        let id = result?;
        tracing::debug!(table = self.table.table_name(), id = %id, "Entity created");
        Ok(id.to_string())
    }

    /// Merges the snapshot's fields over the stored `data`.
    async fn update(&self, id: &str, snapshot: Snapshot) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let query = format!(
            "UPDATE {} SET data = data || $2, updated_at = NOW() WHERE id = $1",
            self.table.table_name()
        );

        let timer = QueryTimer::new("update_entity");
        let result = sqlx::query(&query)
            .bind(id)
            .bind(JsonValue::Object(data_fields(snapshot)))
            .execute(&self.pool)
            .await;
        timer.record();

        if result.map_err(store_error)?.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let query = format!("DELETE FROM {} WHERE id = $1", self.table.table_name());

        let timer = QueryTimer::new("delete_entity");
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await;
        timer.record();

        if result.map_err(store_error)?.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
