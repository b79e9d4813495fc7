//! Guard and router configuration.
//!
//! All knobs are constructor-injected; there is no ambient or static
//! configuration. Omitting a guard config disables that guard entirely.

use std::time::Duration;

/// Per-sender fixed-window quota settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Messages allowed per sender within one window.
    pub max_per_window: u32,
    /// Length of the counting window.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_per_window: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-pair flood and correlation-depth protection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Messages allowed per unordered agent pair within one window.
    pub max_pair_messages_per_window: u32,
    /// Length of the pair counting window.
    pub window: Duration,
    /// How long a tripped circuit stays open.
    pub cooldown: Duration,
    /// Maximum depth of a correlation chain before the pair trips.
    pub max_correlation_depth: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_pair_messages_per_window: 50,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            max_correlation_depth: 20,
        }
    }
}

/// Router policy and guard wiring.
///
/// `rate_limiter: None` / `circuit_breaker: None` mean every message passes
/// that gate.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Allow an agent to message itself. Defaults to false, blocking
    /// same-agent loops.
    pub allow_self_send: bool,
    pub rate_limiter: Option<RateLimiterConfig>,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}
