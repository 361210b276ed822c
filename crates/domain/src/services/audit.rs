//! Audit service facade.
//!
//! Wires the recorder, query service and rollback engine over one set of
//! collaborators so route handlers deal with a single object.

use std::sync::Arc;

use super::context_cache::ContextCache;
use super::ports::{AuditLogStore, EntityRepositories, NetworkOriginLookup, SessionStore};
use super::query::AuditQueryService;
use super::recorder::AuditRecorder;
use super::rollback::RollbackEngine;
use super::settings::AuditSettings;

/// Collaborators the audit services are built from.
#[derive(Clone)]
pub struct AuditBackends {
    pub store: Arc<dyn AuditLogStore>,
    pub repositories: EntityRepositories,
    pub origin_lookup: Arc<dyn NetworkOriginLookup>,
    pub sessions: Arc<dyn SessionStore>,
}

pub struct AuditService {
    pub recorder: Arc<AuditRecorder>,
    pub query: AuditQueryService,
    pub rollback: RollbackEngine,
    settings: AuditSettings,
}

impl AuditService {
    pub fn new(backends: AuditBackends, settings: AuditSettings) -> Self {
        let context = Arc::new(ContextCache::new(
            backends.origin_lookup,
            backends.sessions,
            settings.origin_cache_ttl,
            settings.io_timeout,
        ));
        let recorder = Arc::new(AuditRecorder::new(
            backends.store.clone(),
            context,
            settings.clone(),
        ));
        let query = AuditQueryService::new(backends.store.clone(), settings.clone());
        let rollback = RollbackEngine::new(
            backends.store,
            backends.repositories,
            recorder.clone(),
            settings.clone(),
        );

        Self {
            recorder,
            query,
            rollback,
            settings,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AuditAction, AuditActor, Employee, ListAuditLogsQuery, RequestContext, TargetType,
    };
    use crate::services::in_memory::{
        InMemoryAuditLogStore, InMemoryEntityRepository, InMemorySessionStore, StaticOriginLookup,
    };
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    #[tokio::test]
    async fn test_record_then_browse_then_rollback() {
        let employees = Arc::new(InMemoryEntityRepository::new());
        let service = AuditService::new(
            AuditBackends {
                store: Arc::new(InMemoryAuditLogStore::new()),
                repositories: EntityRepositories::new(
                    employees.clone(),
                    Arc::new(InMemoryEntityRepository::new()),
                ),
                origin_lookup: Arc::new(StaticOriginLookup::new("192.0.2.1")),
                sessions: Arc::new(InMemorySessionStore::new()),
            },
            AuditSettings::default(),
        );

        let email: String = SafeEmail().fake();
        let name: String = Name().fake();
        let ctx = RequestContext::new("org_test").with_actor(AuditActor::new(email, name));

        let employee = Employee::new("E1", "Hanako");
        employees.seed("E1", crate::models::AuditSubject::to_snapshot(&employee));

        let created = service
            .recorder
            .record_employee_action(&ctx, AuditAction::Create, &employee, None)
            .await
            .into_entry()
            .unwrap();

        let listed = service
            .query
            .list(&ctx, &ListAuditLogsQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].target_type, TargetType::Employee);

        service.rollback.rollback(&ctx, created.id).await.unwrap();

        assert!(!employees.contains("E1"));
        let listed = service
            .query
            .list(&ctx, &ListAuditLogsQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].action, AuditAction::Rollback);
        assert_eq!(listed[1].id, created.id);
        assert_eq!(listed[1].after_data, created.after_data);
    }
}
