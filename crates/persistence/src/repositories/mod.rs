//! Repository implementations for database operations.

pub mod audit_log;
pub mod entity;

pub use audit_log::AuditLogRepository;
pub use entity::{EntityTable, PgEntityRepository};
