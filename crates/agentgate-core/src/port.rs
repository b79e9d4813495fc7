//! Capability traits for the router's external collaborators.
//!
//! Validation, delivery, and audit are pluggable: the router depends only on
//! these one-method traits, never on concrete transports or stores. The
//! async traits use RPITIT (Rust 2024, no `async_trait` macro); object-safe
//! `*Dyn` companions with boxed futures enable dynamic dispatch, with a
//! blanket impl so any concrete implementation can be boxed.

use std::future::Future;
use std::pin::Pin;

use agentgate_types::error::{AuditError, DeliveryError};
use agentgate_types::message::A2aMessage;
use agentgate_types::route::{RouteResult, ValidationIssue};

/// Result of validating one raw input.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Input is a well-formed message.
    Valid(A2aMessage),
    /// Input was rejected; issues are never empty.
    Invalid(Vec<ValidationIssue>),
}

/// Validates a raw input against the protocol schema.
///
/// Implementations must be pure: no mutation of the input, no side effects.
pub trait Validate: Send + Sync {
    fn validate(&self, raw: &serde_json::Value) -> ValidationOutcome;
}

/// Hands a message off to its destination agent.
///
/// A returned error means the hand-off failed; the router reports it
/// verbatim as `delivery_failed` and never retries.
pub trait Deliver: Send + Sync {
    fn deliver(
        &self,
        to: &str,
        message: &A2aMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Fire-and-forget observability sink for routing outcomes.
///
/// Called once per terminal result. Failures must not affect routing; the
/// router swallows them.
pub trait Audit: Send + Sync {
    fn record(
        &self,
        message: &serde_json::Value,
        result: &RouteResult,
    ) -> impl Future<Output = Result<(), AuditError>> + Send;
}

/// Object-safe version of [`Deliver`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation covers
/// every `Deliver` type.
pub trait DeliverDyn: Send + Sync {
    fn deliver_boxed<'a>(
        &'a self,
        to: &'a str,
        message: &'a A2aMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;
}

impl<T: Deliver> DeliverDyn for T {
    fn deliver_boxed<'a>(
        &'a self,
        to: &'a str,
        message: &'a A2aMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(self.deliver(to, message))
    }
}

/// Type-erased deliverer held by the router.
pub struct BoxDeliverer {
    inner: Box<dyn DeliverDyn>,
}

impl BoxDeliverer {
    pub fn new<T: Deliver + 'static>(deliverer: T) -> Self {
        Self {
            inner: Box::new(deliverer),
        }
    }

    pub async fn deliver(&self, to: &str, message: &A2aMessage) -> Result<(), DeliveryError> {
        self.inner.deliver_boxed(to, message).await
    }
}

/// Object-safe version of [`Audit`] with boxed futures.
pub trait AuditDyn: Send + Sync {
    fn record_boxed<'a>(
        &'a self,
        message: &'a serde_json::Value,
        result: &'a RouteResult,
    ) -> Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + 'a>>;
}

impl<T: Audit> AuditDyn for T {
    fn record_boxed<'a>(
        &'a self,
        message: &'a serde_json::Value,
        result: &'a RouteResult,
    ) -> Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + 'a>> {
        Box::pin(self.record(message, result))
    }
}

/// Type-erased auditor held by the router.
pub struct BoxAuditor {
    inner: Box<dyn AuditDyn>,
}

impl BoxAuditor {
    pub fn new<T: Audit + 'static>(auditor: T) -> Self {
        Self {
            inner: Box::new(auditor),
        }
    }

    pub async fn record(
        &self,
        message: &serde_json::Value,
        result: &RouteResult,
    ) -> Result<(), AuditError> {
        self.inner.record_boxed(message, result).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use agentgate_types::message::{AgentRef, MessageType, Priority, PROTOCOL_VERSION};
    use agentgate_types::route::RouteStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_message() -> A2aMessage {
        A2aMessage {
            protocol: PROTOCOL_VERSION.to_string(),
            message_id: "m-1".to_string(),
            timestamp: chrono::Utc::now(),
            from: AgentRef::new("alice", "Engineer"),
            to: AgentRef::new("bob", "Reviewer"),
            kind: MessageType::StatusUpdate,
            priority: Priority::Normal,
            payload: serde_json::json!({}),
            correlation_id: None,
        }
    }

    struct CountingDeliverer {
        calls: AtomicUsize,
    }

    impl Deliver for CountingDeliverer {
        async fn deliver(&self, _to: &str, _message: &A2aMessage) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct RefusingAuditor;

    impl Audit for RefusingAuditor {
        async fn record(
            &self,
            _message: &serde_json::Value,
            _result: &RouteResult,
        ) -> Result<(), AuditError> {
            Err(AuditError::Io("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn box_deliverer_delegates_to_inner() {
        let boxed = BoxDeliverer::new(CountingDeliverer {
            calls: AtomicUsize::new(0),
        });
        boxed.deliver("bob", &sample_message()).await.unwrap();
        boxed.deliver("bob", &sample_message()).await.unwrap();
    }

    #[tokio::test]
    async fn box_auditor_propagates_errors() {
        let boxed = BoxAuditor::new(RefusingAuditor);
        let result = RouteResult::rejected(None, RouteStatus::DeliveryFailed, "x");
        let err = boxed
            .record(&serde_json::json!({}), &result)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }
}
