//! Domain layer for the org chart audit service.
//!
//! This crate contains:
//! - Domain models (AuditLogEntry, Employee, Department)
//! - The audit recorder, query service and rollback engine
//! - Collaborator traits with in-memory implementations
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{AuditError, LookupError, StoreError};
