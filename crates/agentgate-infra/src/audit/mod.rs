//! Append-only audit trail on local disk.
//!
//! - `log` -- `JsonlAuditLog`, one JSON line per routed message, daily
//!   files with size rotation
//! - `query` -- filtered reads over the stored entries

pub mod log;
pub mod query;

pub use log::JsonlAuditLog;
pub use query::{AuditFilter, QueryResult};
