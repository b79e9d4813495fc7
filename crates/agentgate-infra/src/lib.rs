//! Infrastructure layer for Agentgate.
//!
//! Contains implementations of the collaborator traits defined in
//! `agentgate-core` that touch the outside world; today that is the
//! append-only JSONL audit log with size rotation and query support.

pub mod audit;

pub use audit::{AuditFilter, JsonlAuditLog, QueryResult};
