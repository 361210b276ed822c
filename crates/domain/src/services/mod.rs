//! Domain services for the audit trail.
//!
//! Services contain business logic that operates on domain models.

pub mod audit;
pub mod context_cache;
pub mod diff;
pub mod in_memory;
pub mod labels;
pub mod ports;
pub mod query;
pub mod recorder;
pub mod rollback;
pub mod settings;

pub use audit::{AuditBackends, AuditService};
pub use context_cache::ContextCache;
pub use diff::{generate_change_summary, get_changed_fields, rollback_summary, SYSTEM_FIELDS};
pub use in_memory::{
    InMemoryAuditLogStore, InMemoryEntityRepository, InMemorySessionStore, StaticOriginLookup,
};
pub use labels::Locale;
pub use ports::{
    ActorProvider, AuditLogStore, EntityRepositories, EntityRepository, NetworkOriginLookup,
    SessionStore,
};
pub use query::{AuditLogPage, AuditQueryService};
pub use recorder::{AuditRecorder, RecordOutcome};
pub use rollback::{RollbackApplied, RollbackEngine, RollbackOutcome};
pub use settings::AuditSettings;
