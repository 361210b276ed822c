//! Persistence layer for the org chart audit service.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the audit log store and entity repositories

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
