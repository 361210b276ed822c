//! Collaborator boundaries consumed by the audit services.
//!
//! Each trait has a PostgreSQL or HTTP implementation in the outer crates and
//! an in-memory implementation in [`super::in_memory`].

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{LookupError, StoreError};
use crate::models::{
    AuditActor, AuditLogCriteria, AuditLogEntry, NewAuditLogEntry, Snapshot, TargetType,
};
use shared::pagination::PageRequest;

/// Append-only storage for audit log entries. Every read is tenant scoped.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Persists a new entry, assigning its `id` and `created_at`.
    async fn insert(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, StoreError>;

    /// Entries matching `criteria`, newest first with ties broken by id descending.
    async fn query(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
        page: PageRequest,
    ) -> Result<Vec<AuditLogEntry>, StoreError>;

    async fn count(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
    ) -> Result<i64, StoreError>;

    async fn get_by_id(
        &self,
        organization_id: &str,
        id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError>;
}

/// CRUD boundary for one entity collection, keyed by opaque string ids.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Snapshot, StoreError>;

    /// Creates an entity and returns the id it was stored under.
    async fn create(&self, snapshot: Snapshot) -> Result<String, StoreError>;

    async fn update(&self, id: &str, snapshot: Snapshot) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Entity repositories for the target types that support rollback.
#[derive(Clone)]
pub struct EntityRepositories {
    pub employees: Arc<dyn EntityRepository>,
    pub departments: Arc<dyn EntityRepository>,
}

impl EntityRepositories {
    pub fn new(
        employees: Arc<dyn EntityRepository>,
        departments: Arc<dyn EntityRepository>,
    ) -> Self {
        Self {
            employees,
            departments,
        }
    }

    pub fn for_target(&self, target_type: TargetType) -> Option<&Arc<dyn EntityRepository>> {
        match target_type {
            TargetType::Employee => Some(&self.employees),
            TargetType::Department => Some(&self.departments),
            TargetType::Role | TargetType::Editor | TargetType::System => None,
        }
    }
}

/// Resolves the current caller.
pub trait ActorProvider {
    fn current_actor(&self) -> Option<AuditActor>;
}

impl ActorProvider for crate::models::RequestContext {
    fn current_actor(&self) -> Option<AuditActor> {
        self.actor.clone()
    }
}

/// Looks up the caller's public network origin (IP address).
#[async_trait]
pub trait NetworkOriginLookup: Send + Sync {
    async fn lookup(&self) -> Result<String, LookupError>;
}

/// Session-scoped key/value storage for audit session ids.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_key: &str) -> Option<String>;

    fn put(&self, session_key: &str, token: String);
}

/// Bounds a store call, mapping an elapsed timer to [`StoreError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_maps_elapsed_to_timeout() {
        let result: Result<(), StoreError> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
