//! Schemaless org chart entity row.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the `employees` or `departments` table. Domain fields live in `data`.
#[derive(Debug, Clone, FromRow)]
pub struct EntityRowEntity {
    pub id: Uuid,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
