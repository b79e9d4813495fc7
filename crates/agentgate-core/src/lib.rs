//! Message router and guard subsystems for agent-to-agent traffic.
//!
//! The routing pipeline is: validate -> self-send check -> rate limit ->
//! circuit breaker -> deliver -> audit (best-effort). Each gate can
//! short-circuit with a terminal status before delivery is attempted.
//!
//! - `router` -- `A2aRouter`, the only component message producers call
//! - `guard` -- `RateLimiter` (per-sender quota) and `CircuitBreaker`
//!   (per-pair flood and correlation-depth protection)
//! - `port` -- capability traits for the validate/deliver/audit collaborators
//! - `validator` -- `ProtocolValidator` for the A2A v1 envelope
//! - `delivery` -- in-process `MailboxDeliverer`
//! - `envelope` -- helper constructors for well-formed messages

pub mod delivery;
pub mod envelope;
pub mod guard;
pub mod port;
pub mod router;
pub mod validator;

pub use delivery::MailboxDeliverer;
pub use guard::{CircuitBreaker, CircuitState, RateLimiter};
pub use port::{Audit, Deliver, Validate, ValidationOutcome};
pub use router::A2aRouter;
pub use validator::ProtocolValidator;
