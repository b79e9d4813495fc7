//! Audit trail entry types.
//!
//! One `AuditEntry` is recorded per routed message. The message is kept as
//! raw JSON so rejected inputs that never became a typed envelope can still
//! be logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the JSONL audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The routed message (or raw input, for rejected messages).
    pub message: serde_json::Value,
    pub meta: AuditMeta,
}

/// Delivery metadata attached to an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMeta {
    /// When the gateway handled the message.
    pub received_at: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Which gateway instance processed the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

/// Coarse audit outcome: delivered, or stopped anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}
