//! Audit query service: tenant-scoped, filtered, paginated reads.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::ports::{with_timeout, AuditLogStore};
use super::settings::AuditSettings;
use crate::errors::AuditError;
use crate::models::{AuditLogCriteria, AuditLogEntry, ListAuditLogsQuery, RequestContext};
use shared::pagination::{PageInfo, PageRequest};

/// One page of entries with its pagination info.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub data: Vec<AuditLogEntry>,
    pub pagination: PageInfo,
}

pub struct AuditQueryService {
    store: Arc<dyn AuditLogStore>,
    settings: AuditSettings,
}

impl AuditQueryService {
    pub fn new(store: Arc<dyn AuditLogStore>, settings: AuditSettings) -> Self {
        Self { store, settings }
    }

    /// Normalizes raw paging input against the configured page sizes.
    pub fn page_request(&self, query: &ListAuditLogsQuery) -> PageRequest {
        PageRequest::normalize(
            query.offset,
            query.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        )
    }

    /// Entries newest first. Anonymous callers get an empty list.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        query: &ListAuditLogsQuery,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        if !ctx.is_authenticated() {
            tracing::debug!("Anonymous audit log listing, returning empty result");
            return Ok(Vec::new());
        }

        let page = self.page_request(query);
        let criteria = query.criteria();
        let entries = with_timeout(
            self.settings.io_timeout,
            self.store.query(&ctx.organization_id, &criteria, page),
        )
        .await?;

        Ok(entries)
    }

    /// Number of entries matching `criteria`. Anonymous callers get zero.
    pub async fn count(
        &self,
        ctx: &RequestContext,
        criteria: &AuditLogCriteria,
    ) -> Result<i64, AuditError> {
        if !ctx.is_authenticated() {
            return Ok(0);
        }

        let total = with_timeout(
            self.settings.io_timeout,
            self.store.count(&ctx.organization_id, criteria),
        )
        .await?;

        Ok(total)
    }

    /// List and count in one call, for paginated UIs.
    pub async fn list_page(
        &self,
        ctx: &RequestContext,
        query: &ListAuditLogsQuery,
    ) -> Result<AuditLogPage, AuditError> {
        let page = self.page_request(query);
        let data = self.list(ctx, query).await?;
        let total = self.count(ctx, &query.criteria()).await?;

        Ok(AuditLogPage {
            data,
            pagination: PageInfo::new(page, total),
        })
    }

    /// Single entry of the caller's organization.
    pub async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<AuditLogEntry, AuditError> {
        if !ctx.is_authenticated() {
            return Err(AuditError::Unauthenticated);
        }

        with_timeout(
            self.settings.io_timeout,
            self.store.get_by_id(&ctx.organization_id, id),
        )
        .await?
        .ok_or(AuditError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditAction, AuditActor, NewAuditLogEntry, Snapshot, TargetType};
    use crate::services::in_memory::InMemoryAuditLogStore;
    use std::collections::HashSet;

    fn ctx(org: &str) -> RequestContext {
        RequestContext::new(org).with_actor(AuditActor::new("ops@example.com", "Ops"))
    }

    fn new_entry(org: &str, action: AuditAction, email: &str) -> NewAuditLogEntry {
        NewAuditLogEntry {
            organization_id: org.to_string(),
            actor: AuditActor::new(email, "Someone"),
            action,
            target_type: TargetType::Department,
            target_id: Some("d-1".to_string()),
            target_name: Some("Sales".to_string()),
            before_data: None,
            after_data: Some(Snapshot::new()),
            change_summary: "Department Sales was created".to_string(),
            ip_address: None,
            user_agent: None,
            session_id: None,
            metadata: None,
        }
    }

    async fn seeded(count: usize) -> (Arc<InMemoryAuditLogStore>, AuditQueryService) {
        let store = Arc::new(InMemoryAuditLogStore::new());
        for _ in 0..count {
            store
                .insert(new_entry("org_test", AuditAction::Create, "a@example.com"))
                .await
                .unwrap();
        }
        let service = AuditQueryService::new(store.clone(), AuditSettings::default());
        (store, service)
    }

    #[tokio::test]
    async fn test_pages_do_not_overlap() {
        let (_, service) = seeded(120).await;
        let ctx = ctx("org_test");

        let first = service
            .list(&ctx, &ListAuditLogsQuery { offset: Some(0), limit: Some(50), ..Default::default() })
            .await
            .unwrap();
        let second = service
            .list(&ctx, &ListAuditLogsQuery { offset: Some(50), limit: Some(50), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(first.len(), 50);
        assert_eq!(second.len(), 50);

        let ids: HashSet<Uuid> = first.iter().chain(second.iter()).map(|e| e.id).collect();
        assert_eq!(ids.len(), 100);

        let all: Vec<&AuditLogEntry> = first.iter().chain(second.iter()).collect();
        assert!(all.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }

    #[tokio::test]
    async fn test_limit_clamped_and_offset_floored() {
        let (_, service) = seeded(120).await;

        let entries = service
            .list(
                &ctx("org_test"),
                &ListAuditLogsQuery { offset: Some(-5), limit: Some(1000), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 100);
    }

    #[tokio::test]
    async fn test_anonymous_reads_degrade() {
        let (_, service) = seeded(3).await;
        let anonymous = RequestContext::new("org_test");

        assert!(service
            .list(&anonymous, &ListAuditLogsQuery::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            service.count(&anonymous, &AuditLogCriteria::default()).await.unwrap(),
            0
        );
        assert_eq!(
            service.get_by_id(&anonymous, Uuid::new_v4()).await,
            Err(AuditError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive_and_tenant_scoped() {
        let store = Arc::new(InMemoryAuditLogStore::new());
        store.insert(new_entry("org_test", AuditAction::Create, "a@example.com")).await.unwrap();
        store.insert(new_entry("org_test", AuditAction::Delete, "a@example.com")).await.unwrap();
        store.insert(new_entry("org_test", AuditAction::Delete, "b@example.com")).await.unwrap();
        store.insert(new_entry("org_other", AuditAction::Delete, "a@example.com")).await.unwrap();
        let service = AuditQueryService::new(store, AuditSettings::default());

        let criteria = AuditLogCriteria {
            action: Some(AuditAction::Delete),
            actor_email: Some("a@example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(service.count(&ctx("org_test"), &criteria).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_is_tenant_scoped() {
        let store = Arc::new(InMemoryAuditLogStore::new());
        let other = store
            .insert(new_entry("org_other", AuditAction::Create, "a@example.com"))
            .await
            .unwrap();
        let service = AuditQueryService::new(store, AuditSettings::default());

        assert_eq!(
            service.get_by_id(&ctx("org_test"), other.id).await,
            Err(AuditError::NotFound)
        );
        assert!(service.get_by_id(&ctx("org_other"), other.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_page_reports_total() {
        let (_, service) = seeded(7).await;

        let page = service
            .list_page(&ctx("org_test"), &ListAuditLogsQuery { limit: Some(5), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.data.len(), 5);
        assert_eq!(page.pagination.total, 7);
        assert!(page.pagination.has_next);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let (store, service) = seeded(1).await;
        store.set_failing(true);

        let result = service.list(&ctx("org_test"), &ListAuditLogsQuery::default()).await;

        assert!(matches!(result, Err(AuditError::StorageFailure(_))));
    }
}
