//! The A2A message router.
//!
//! `A2aRouter` is the only component message producers call. Every call to
//! [`A2aRouter::route`] runs the full gate pipeline and completes with a
//! `RouteResult`; collaborator failures become terminal statuses, never
//! panics or errors propagated to the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use agentgate_types::config::RouterConfig;
use agentgate_types::message::A2aMessage;
use agentgate_types::route::{RouteResult, RouteStatus, ValidationIssue};

use crate::guard::{CircuitBreaker, RateLimiter};
use crate::port::{Audit, BoxAuditor, BoxDeliverer, Deliver, Validate, ValidationOutcome};

/// Router over one deliverer with optional validation, audit, and guards.
///
/// Multiple independent routers (e.g. per tenant) never interfere: all
/// guard state is owned by the instance, with no static mutable state.
pub struct A2aRouter {
    deliverer: BoxDeliverer,
    validator: Option<Box<dyn Validate>>,
    auditor: Option<BoxAuditor>,
    allow_self_send: bool,
    rate_limiter: Option<RateLimiter>,
    circuit_breaker: Option<CircuitBreaker>,
    metrics: RouterMetrics,
}

impl A2aRouter {
    /// Build a router around the required deliverer. Guards are constructed
    /// from the config; a missing guard config disables that gate.
    pub fn new<D: Deliver + 'static>(deliverer: D, config: RouterConfig) -> Self {
        Self {
            deliverer: BoxDeliverer::new(deliverer),
            validator: None,
            auditor: None,
            allow_self_send: config.allow_self_send,
            rate_limiter: config.rate_limiter.map(RateLimiter::new),
            circuit_breaker: config.circuit_breaker.map(CircuitBreaker::new),
            metrics: RouterMetrics::default(),
        }
    }

    /// Attach a validator. Without one, raw inputs are deserialized
    /// directly into the typed envelope.
    pub fn with_validator<V: Validate + 'static>(mut self, validator: V) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Attach a best-effort audit sink.
    pub fn with_auditor<A: Audit + 'static>(mut self, auditor: A) -> Self {
        self.auditor = Some(BoxAuditor::new(auditor));
        self
    }

    /// Route one raw input through the gate pipeline.
    ///
    /// Pipeline: validate -> self-send -> rate limit -> circuit breaker ->
    /// deliver, with audit and metrics applied to every terminal result.
    /// Guard locks are never held across the deliver/audit awaits.
    pub async fn route(&self, raw: serde_json::Value) -> RouteResult {
        let message_id = raw
            .get("messageId")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        let message = match self.validate(&raw, message_id) {
            Ok(message) => message,
            Err(result) => return self.finish(&raw, result).await,
        };

        let result = self.dispatch(&message).await;
        self.finish(&raw, result).await
    }

    fn validate(
        &self,
        raw: &serde_json::Value,
        message_id: Option<String>,
    ) -> Result<A2aMessage, RouteResult> {
        match &self.validator {
            Some(validator) => match validator.validate(raw) {
                ValidationOutcome::Valid(message) => Ok(message),
                ValidationOutcome::Invalid(issues) => {
                    Err(RouteResult::validation_failed(message_id, issues))
                }
            },
            None => serde_json::from_value::<A2aMessage>(raw.clone()).map_err(|err| {
                RouteResult::validation_failed(
                    message_id,
                    vec![ValidationIssue::new("/", err.to_string(), "deserialize")],
                )
            }),
        }
    }

    async fn dispatch(&self, message: &A2aMessage) -> RouteResult {
        let message_id = Some(message.message_id.clone());
        let sender = &message.from.agent_id;
        let recipient = &message.to.agent_id;

        if sender == recipient && !self.allow_self_send {
            return RouteResult::rejected(
                message_id,
                RouteStatus::SelfSendRejected,
                format!("self-send rejected for agent {sender}"),
            );
        }

        let mut rate_limit_remaining = None;
        if let Some(limiter) = &self.rate_limiter {
            let decision = limiter.check(sender);
            if !decision.allowed {
                return RouteResult::rejected(
                    message_id,
                    RouteStatus::RateLimited,
                    format!("rate limit exceeded for sender {sender}"),
                );
            }
            rate_limit_remaining = Some(decision.remaining);
        }

        if let Some(breaker) = &self.circuit_breaker {
            let decision = breaker.check(sender, recipient, message.correlation_id.as_deref());
            if !decision.allowed {
                let reason = decision
                    .reason
                    .unwrap_or_else(|| "circuit open".to_string());
                return RouteResult::rejected(
                    message_id,
                    RouteStatus::CircuitOpen,
                    format!("circuit breaker: {reason}"),
                );
            }
        }

        match self.deliverer.deliver(recipient, message).await {
            Ok(()) => {
                debug!(
                    message_id = %message.message_id,
                    from = %sender,
                    to = %recipient,
                    kind = %message.kind,
                    "message delivered"
                );
                RouteResult::delivered(message_id, rate_limit_remaining)
            }
            Err(err) => {
                RouteResult::rejected(message_id, RouteStatus::DeliveryFailed, err.to_string())
            }
        }
    }

    /// Audit the terminal result (best-effort) and record metrics.
    async fn finish(&self, raw: &serde_json::Value, result: RouteResult) -> RouteResult {
        if let Some(auditor) = &self.auditor {
            if let Err(err) = auditor.record(raw, &result).await {
                warn!(error = %err, status = %result.status, "audit hook failed; result unaffected");
            }
        }
        self.metrics.record(result.status);
        result
    }

    /// Snapshot of the running counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero all metrics and clear limiter and breaker state, returning the
    /// whole subsystem to its initial condition.
    pub fn reset(&self) {
        self.metrics.reset();
        if let Some(limiter) = &self.rate_limiter {
            limiter.clear();
        }
        if let Some(breaker) = &self.circuit_breaker {
            breaker.clear();
        }
    }
}

impl std::fmt::Debug for A2aRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2aRouter")
            .field("allow_self_send", &self.allow_self_send)
            .field("has_validator", &self.validator.is_some())
            .field("has_auditor", &self.auditor.is_some())
            .field("rate_limiter", &self.rate_limiter)
            .field("circuit_breaker", &self.circuit_breaker)
            .finish()
    }
}

/// Process-wide routing counters, one per terminal status plus the total.
#[derive(Debug, Default)]
struct RouterMetrics {
    total_routed: AtomicU64,
    total_delivered: AtomicU64,
    total_validation_failed: AtomicU64,
    total_self_send_rejected: AtomicU64,
    total_rate_limited: AtomicU64,
    total_circuit_open: AtomicU64,
    total_delivery_failed: AtomicU64,
}

impl RouterMetrics {
    fn record(&self, status: RouteStatus) {
        self.total_routed.fetch_add(1, Ordering::Relaxed);
        let counter = match status {
            RouteStatus::Delivered => &self.total_delivered,
            RouteStatus::ValidationFailed => &self.total_validation_failed,
            RouteStatus::SelfSendRejected => &self.total_self_send_rejected,
            RouteStatus::RateLimited => &self.total_rate_limited,
            RouteStatus::CircuitOpen => &self.total_circuit_open,
            RouteStatus::DeliveryFailed => &self.total_delivery_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_routed: self.total_routed.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_validation_failed: self.total_validation_failed.load(Ordering::Relaxed),
            total_self_send_rejected: self.total_self_send_rejected.load(Ordering::Relaxed),
            total_rate_limited: self.total_rate_limited.load(Ordering::Relaxed),
            total_circuit_open: self.total_circuit_open.load(Ordering::Relaxed),
            total_delivery_failed: self.total_delivery_failed.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.total_routed.store(0, Ordering::Relaxed);
        self.total_delivered.store(0, Ordering::Relaxed);
        self.total_validation_failed.store(0, Ordering::Relaxed);
        self.total_self_send_rejected.store(0, Ordering::Relaxed);
        self.total_rate_limited.store(0, Ordering::Relaxed);
        self.total_circuit_open.store(0, Ordering::Relaxed);
        self.total_delivery_failed.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the router's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_routed: u64,
    pub total_delivered: u64,
    pub total_validation_failed: u64,
    pub total_self_send_rejected: u64,
    pub total_rate_limited: u64,
    pub total_circuit_open: u64,
    pub total_delivery_failed: u64,
}

impl MetricsSnapshot {
    /// Sum of all terminal-status counters. Always equals `total_routed`.
    pub fn total_terminal(&self) -> u64 {
        self.total_delivered
            + self.total_validation_failed
            + self.total_self_send_rejected
            + self.total_rate_limited
            + self.total_circuit_open
            + self.total_delivery_failed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use serde_json::{Value, json};

    use agentgate_types::config::{CircuitBreakerConfig, RateLimiterConfig};
    use agentgate_types::error::{AuditError, DeliveryError};
    use agentgate_types::message::{AgentRef, MessageType, PROTOCOL_VERSION, Priority};

    fn raw_message(from: &str, to: &str) -> Value {
        json!({
            "protocol": PROTOCOL_VERSION,
            "messageId": format!("msg-{from}-{to}"),
            "timestamp": "2026-02-21T18:30:00Z",
            "from": {"agentId": from, "role": "Engineer"},
            "to": {"agentId": to, "role": "Reviewer"},
            "type": "status_update",
            "priority": "normal",
            "payload": {"status": "in_progress", "progress": "working"},
        })
    }

    #[derive(Clone, Default)]
    struct OkDeliverer {
        calls: Arc<AtomicUsize>,
    }

    impl Deliver for OkDeliverer {
        async fn deliver(&self, _to: &str, _message: &A2aMessage) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingDeliverer;

    impl Deliver for FailingDeliverer {
        async fn deliver(&self, _to: &str, _message: &A2aMessage) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("Connection timeout".to_string()))
        }
    }

    struct RejectAllValidator;

    impl Validate for RejectAllValidator {
        fn validate(&self, _raw: &Value) -> ValidationOutcome {
            ValidationOutcome::Invalid(vec![ValidationIssue::new("/", "rejected", "test")])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAuditor {
        seen: Arc<Mutex<Vec<RouteStatus>>>,
    }

    impl Audit for RecordingAuditor {
        async fn record(&self, _message: &Value, result: &RouteResult) -> Result<(), AuditError> {
            self.seen.lock().unwrap().push(result.status);
            Ok(())
        }
    }

    struct PanickyAuditor;

    impl Audit for PanickyAuditor {
        async fn record(&self, _message: &Value, _result: &RouteResult) -> Result<(), AuditError> {
            Err(AuditError::Io("audit store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn well_formed_message_is_delivered_with_no_guards() {
        let router = A2aRouter::new(OkDeliverer::default(), RouterConfig::default());
        let result = router.route(raw_message("alice", "bob")).await;

        assert_eq!(result.status, RouteStatus::Delivered);
        assert_eq!(result.message_id.as_deref(), Some("msg-alice-bob"));
        // No limiter configured, so no remaining quota is reported.
        assert!(result.rate_limit_remaining.is_none());
    }

    #[tokio::test]
    async fn failing_validator_short_circuits_before_delivery() {
        let deliverer = OkDeliverer::default();
        let calls = Arc::clone(&deliverer.calls);
        let router =
            A2aRouter::new(deliverer, RouterConfig::default()).with_validator(RejectAllValidator);

        let result = router.route(raw_message("alice", "bob")).await;

        assert_eq!(result.status, RouteStatus::ValidationFailed);
        assert!(!result.errors.as_ref().unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn without_validator_bad_input_reports_validation_failed() {
        let router = A2aRouter::new(OkDeliverer::default(), RouterConfig::default());
        let result = router.route(json!({"bad": "message"})).await;

        assert_eq!(result.status, RouteStatus::ValidationFailed);
        assert_eq!(result.errors.as_ref().unwrap().len(), 1);
        assert_eq!(result.errors.as_ref().unwrap()[0].rule, "deserialize");
    }

    #[tokio::test]
    async fn self_send_is_rejected_by_default_and_allowed_by_config() {
        let deliverer = OkDeliverer::default();
        let calls = Arc::clone(&deliverer.calls);
        let router = A2aRouter::new(deliverer, RouterConfig::default());

        let result = router.route(raw_message("alice", "alice")).await;
        assert_eq!(result.status, RouteStatus::SelfSendRejected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                allow_self_send: true,
                ..RouterConfig::default()
            },
        );
        let result = router.route(raw_message("alice", "alice")).await;
        assert_eq!(result.status, RouteStatus::Delivered);
    }

    #[tokio::test]
    async fn rate_limit_denies_with_limiter_error_text() {
        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                rate_limiter: Some(RateLimiterConfig {
                    max_per_window: 2,
                    window: Duration::from_secs(60),
                }),
                ..RouterConfig::default()
            },
        );

        let first = router.route(raw_message("alice", "bob")).await;
        assert_eq!(first.status, RouteStatus::Delivered);
        assert_eq!(first.rate_limit_remaining, Some(1));

        let second = router.route(raw_message("alice", "bob")).await;
        assert_eq!(second.rate_limit_remaining, Some(0));

        let third = router.route(raw_message("alice", "bob")).await;
        assert_eq!(third.status, RouteStatus::RateLimited);
        assert!(third.error.as_ref().unwrap().contains("rate limit"));
    }

    #[tokio::test]
    async fn circuit_open_carries_the_breaker_reason() {
        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                circuit_breaker: Some(CircuitBreakerConfig {
                    max_pair_messages_per_window: 1,
                    window: Duration::from_secs(60),
                    cooldown: Duration::from_secs(30),
                    max_correlation_depth: 50,
                }),
                ..RouterConfig::default()
            },
        );

        let first = router.route(raw_message("alice", "bob")).await;
        assert_eq!(first.status, RouteStatus::Delivered);

        let second = router.route(raw_message("alice", "bob")).await;
        assert_eq!(second.status, RouteStatus::CircuitOpen);
        assert!(second.error.as_ref().unwrap().contains("exceeded"));
    }

    #[tokio::test]
    async fn delivery_error_is_reported_verbatim() {
        let router = A2aRouter::new(FailingDeliverer, RouterConfig::default());
        let result = router.route(raw_message("alice", "bob")).await;

        assert_eq!(result.status, RouteStatus::DeliveryFailed);
        assert!(result.error.as_ref().unwrap().contains("Connection timeout"));
    }

    #[tokio::test]
    async fn audit_sees_every_terminal_status() {
        let auditor = RecordingAuditor::default();
        let seen = Arc::clone(&auditor.seen);
        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                rate_limiter: Some(RateLimiterConfig {
                    max_per_window: 1,
                    window: Duration::from_secs(60),
                }),
                ..RouterConfig::default()
            },
        )
        .with_auditor(auditor);

        router.route(raw_message("alice", "bob")).await;
        router.route(raw_message("alice", "bob")).await;
        router.route(json!({"bad": "message"})).await;

        let statuses = seen.lock().unwrap().clone();
        assert_eq!(
            statuses,
            vec![
                RouteStatus::Delivered,
                RouteStatus::RateLimited,
                RouteStatus::ValidationFailed,
            ]
        );
    }

    #[tokio::test]
    async fn audit_failure_never_changes_the_result() {
        let router =
            A2aRouter::new(OkDeliverer::default(), RouterConfig::default()).with_auditor(PanickyAuditor);

        let result = router.route(raw_message("alice", "bob")).await;
        assert_eq!(result.status, RouteStatus::Delivered);
    }

    #[tokio::test]
    async fn metrics_account_for_every_route() {
        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                rate_limiter: Some(RateLimiterConfig {
                    max_per_window: 2,
                    window: Duration::from_secs(60),
                }),
                ..RouterConfig::default()
            },
        );

        router.route(raw_message("alice", "bob")).await;
        router.route(raw_message("alice", "bob")).await;
        router.route(raw_message("alice", "bob")).await; // rate limited
        router.route(json!({"bad": "message"})).await; // validation failed
        router.route(raw_message("carol", "carol")).await; // self-send

        let metrics = router.metrics();
        assert_eq!(metrics.total_routed, 5);
        assert_eq!(metrics.total_delivered, 2);
        assert_eq!(metrics.total_rate_limited, 1);
        assert_eq!(metrics.total_validation_failed, 1);
        assert_eq!(metrics.total_self_send_rejected, 1);
        assert_eq!(metrics.total_terminal(), metrics.total_routed);
    }

    #[tokio::test]
    async fn reset_restores_initial_condition() {
        let router = A2aRouter::new(
            OkDeliverer::default(),
            RouterConfig {
                rate_limiter: Some(RateLimiterConfig {
                    max_per_window: 1,
                    window: Duration::from_secs(60),
                }),
                ..RouterConfig::default()
            },
        );

        router.route(raw_message("alice", "bob")).await;
        let blocked = router.route(raw_message("alice", "bob")).await;
        assert_eq!(blocked.status, RouteStatus::RateLimited);

        router.reset();

        assert_eq!(router.metrics().total_routed, 0);
        // Limiter state was cleared along with the metrics.
        let after = router.route(raw_message("alice", "bob")).await;
        assert_eq!(after.status, RouteStatus::Delivered);
    }

    #[tokio::test]
    async fn delivered_message_envelope_fields_survive_the_trip() {
        // The router must never mutate a message: deliver it and compare.
        struct CapturingDeliverer {
            captured: Arc<Mutex<Option<A2aMessage>>>,
        }
        impl Deliver for CapturingDeliverer {
            async fn deliver(&self, _to: &str, message: &A2aMessage) -> Result<(), DeliveryError> {
                *self.captured.lock().unwrap() = Some(message.clone());
                Ok(())
            }
        }

        let captured = Arc::new(Mutex::new(None));
        let router = A2aRouter::new(
            CapturingDeliverer {
                captured: Arc::clone(&captured),
            },
            RouterConfig::default(),
        );

        router.route(raw_message("alice", "bob")).await;

        let message = captured.lock().unwrap().clone().unwrap();
        assert_eq!(message.from, AgentRef::new("alice", "Engineer"));
        assert_eq!(message.kind, MessageType::StatusUpdate);
        assert_eq!(message.priority, Priority::Normal);
    }
}
