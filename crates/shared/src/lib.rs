//! Shared utilities and common types for the org chart audit service.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT validation (and minting, for tests and tooling)
//! - Offset pagination normalization
//! - Session token generation

pub mod jwt;
pub mod pagination;
pub mod session;
