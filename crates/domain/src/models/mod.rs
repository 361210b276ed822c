//! Domain models for the org chart audit trail.

pub mod audit_log;
pub mod context;
pub mod department;
pub mod employee;

pub use audit_log::{
    AuditAction, AuditActor, AuditLogCriteria, AuditLogEntry, ListAuditLogsQuery, Metadata,
    NewAuditLogEntry, RecordAuditInput, Snapshot, TargetType, ORIGINAL_ACTION_KEY,
    ORIGINAL_ENTRY_ID_KEY,
};
pub use context::RequestContext;
pub use department::Department;
pub use employee::Employee;

/// An entity whose lifecycle is recorded in the audit trail.
pub trait AuditSubject {
    const TARGET_TYPE: TargetType;

    fn subject_id(&self) -> Option<String>;

    fn subject_name(&self) -> Option<String>;

    /// Field-level view of the entity as stored in `beforeData`/`afterData`.
    fn to_snapshot(&self) -> Snapshot;
}
