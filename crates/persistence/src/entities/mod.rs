//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod audit_log;
pub mod entity_row;

pub use audit_log::AuditLogEntity;
pub use entity_row::EntityRowEntity;
