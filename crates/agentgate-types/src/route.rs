//! Routing outcome types.
//!
//! Every call to the router produces exactly one `RouteResult` with one
//! terminal `RouteStatus`; failures are values, never panics or errors
//! propagated to the caller.

use serde::{Deserialize, Serialize};

/// Terminal status of a single routing attempt, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Delivered,
    ValidationFailed,
    SelfSendRejected,
    RateLimited,
    CircuitOpen,
    DeliveryFailed,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Delivered => "delivered",
            RouteStatus::ValidationFailed => "validation_failed",
            RouteStatus::SelfSendRejected => "self_send_rejected",
            RouteStatus::RateLimited => "rate_limited",
            RouteStatus::CircuitOpen => "circuit_open",
            RouteStatus::DeliveryFailed => "delivery_failed",
        }
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON-pointer style location (e.g. `/payload/taskId`).
    pub path: String,
    /// Human-readable description of what is wrong.
    pub message: String,
    /// Short rule tag (e.g. `required`, `enum`, `type`).
    pub rule: String,
}

impl ValidationIssue {
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            rule: rule.into(),
        }
    }
}

/// The router's answer for one `route()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// Echoed from the input when parseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// The terminal pipeline status.
    pub status: RouteStatus,
    /// Failure detail for all non-delivered statuses except
    /// `validation_failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured issues, present only when `status = validation_failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationIssue>>,
    /// Remaining sender quota after this message, present only on the
    /// delivered path when a rate limiter is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_remaining: Option<u32>,
}

impl RouteResult {
    /// Successful delivery.
    pub fn delivered(message_id: Option<String>, rate_limit_remaining: Option<u32>) -> Self {
        Self {
            message_id,
            status: RouteStatus::Delivered,
            error: None,
            errors: None,
            rate_limit_remaining,
        }
    }

    /// Structural rejection carrying the validator's issues.
    pub fn validation_failed(message_id: Option<String>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            message_id,
            status: RouteStatus::ValidationFailed,
            error: None,
            errors: Some(issues),
            rate_limit_remaining: None,
        }
    }

    /// Any other non-delivered terminal status with its error text.
    pub fn rejected(
        message_id: Option<String>,
        status: RouteStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            message_id,
            status,
            error: Some(error.into()),
            errors: None,
            rate_limit_remaining: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
