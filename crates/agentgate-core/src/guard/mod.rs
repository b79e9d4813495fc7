//! Guard subsystems consulted by the router before delivery.
//!
//! - `rate_limiter` -- per-sender fixed-window quota
//! - `circuit_breaker` -- per-pair flood and correlation-depth protection
//!   with open/cooldown semantics

pub mod circuit_breaker;
pub mod rate_limiter;

pub use circuit_breaker::{BreakerDecision, CircuitBreaker, CircuitState, PairKey};
pub use rate_limiter::{RateDecision, RateLimiter};
