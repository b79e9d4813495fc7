//! Per-pair circuit breaking for agent-to-agent traffic.
//!
//! Two independent trip conditions protect each unordered agent pair:
//! correlation-chain depth and message flood within a fixed window. A
//! tripped circuit blocks all traffic for the pair until a cooldown
//! elapses, then closes again on the next check.
//!
//! Correlation counters are scoped per pair (keyed by pair + correlation
//! id), matching the breaker's pair-oriented model: the same correlation id
//! seen across different pairs counts separately.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use agentgate_types::config::CircuitBreakerConfig;

/// Canonical order-independent identifier for an unordered agent pair.
///
/// Constructed in exactly one place so `A -> B` and `B -> A` always hit the
/// same counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<->{}", self.0, self.1)
    }
}

/// Observable circuit state for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
        }
    }
}

/// Answer to one breaker check.
#[derive(Debug, Clone)]
pub struct BreakerDecision {
    pub allowed: bool,
    /// Why the call was denied, when it was.
    pub reason: Option<String>,
    pub state: CircuitState,
}

#[derive(Debug)]
struct PairState {
    state: CircuitState,
    window_count: u32,
    window_start: Instant,
    opened_at: Option<Instant>,
}

impl PairState {
    fn fresh(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            window_count: 0,
            window_start: now,
            opened_at: None,
        }
    }

    fn trip(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
    }

    fn close(&mut self, now: Instant) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.window_count = 0;
        self.window_start = now;
    }
}

/// Per-pair flood and correlation-depth guard with auto-recovery.
///
/// All state is in-memory and process-local; the breaker is a safety valve,
/// not a ledger.
pub struct CircuitBreaker {
    max_pair_messages_per_window: u32,
    window: Duration,
    cooldown: Duration,
    max_correlation_depth: u32,
    pairs: DashMap<PairKey, PairState>,
    correlations: DashMap<(PairKey, String), u32>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            max_pair_messages_per_window: config.max_pair_messages_per_window,
            window: config.window,
            cooldown: config.cooldown,
            max_correlation_depth: config.max_correlation_depth,
            pairs: DashMap::new(),
            correlations: DashMap::new(),
        }
    }

    /// Check one message between `a` and `b` at the current time.
    pub fn check(&self, a: &str, b: &str, correlation_id: Option<&str>) -> BreakerDecision {
        self.check_at(a, b, correlation_id, Instant::now())
    }

    /// Check one message between `a` and `b` at an explicit time.
    ///
    /// Evaluation order: open-state / cooldown handling, then the
    /// correlation depth guard, then the pair flood guard. The pair entry
    /// lock is held only for the counting decision.
    pub fn check_at(
        &self,
        a: &str,
        b: &str,
        correlation_id: Option<&str>,
        now: Instant,
    ) -> BreakerDecision {
        let key = PairKey::new(a, b);
        let mut entry = self
            .pairs
            .entry(key.clone())
            .or_insert_with(|| PairState::fresh(now));
        let pair = entry.value_mut();

        // An open circuit blocks everything until the cooldown elapses; no
        // counting happens while cooling. The first check at or past the
        // cooldown closes the circuit and is evaluated fresh below.
        if pair.state == CircuitState::Open {
            match pair.opened_at {
                Some(opened_at) if now.duration_since(opened_at) < self.cooldown => {
                    return BreakerDecision {
                        allowed: false,
                        reason: Some(format!("circuit open for pair {key}")),
                        state: CircuitState::Open,
                    };
                }
                _ => pair.close(now),
            }
        }

        if let Some(correlation_id) = correlation_id {
            let mut depth = self
                .correlations
                .entry((key.clone(), correlation_id.to_string()))
                .or_insert(0);
            *depth += 1;
            if *depth > self.max_correlation_depth {
                drop(depth);
                pair.trip(now);
                tracing::warn!(pair = %key, correlation_id, "circuit tripped: correlation depth");
                return BreakerDecision {
                    allowed: false,
                    reason: Some(format!(
                        "correlation chain exceeded max depth ({})",
                        self.max_correlation_depth
                    )),
                    state: CircuitState::Open,
                };
            }
        }

        if now.duration_since(pair.window_start) >= self.window {
            pair.window_count = 0;
            pair.window_start = now;
        }
        if pair.window_count >= self.max_pair_messages_per_window {
            pair.trip(now);
            tracing::warn!(pair = %key, "circuit tripped: pair message flood");
            return BreakerDecision {
                allowed: false,
                reason: Some(format!(
                    "pair message rate exceeded ({} per window)",
                    self.max_pair_messages_per_window
                )),
                state: CircuitState::Open,
            };
        }
        pair.window_count += 1;

        BreakerDecision {
            allowed: true,
            reason: None,
            state: CircuitState::Closed,
        }
    }

    /// Current state for a pair, without consuming quota or mutating
    /// anything. An open circuit whose cooldown has elapsed reads as
    /// closed, matching what the next real check would observe.
    pub fn state_of(&self, a: &str, b: &str) -> CircuitState {
        self.state_of_at(a, b, Instant::now())
    }

    pub fn state_of_at(&self, a: &str, b: &str, now: Instant) -> CircuitState {
        match self.pairs.get(&PairKey::new(a, b)) {
            Some(pair) if pair.state == CircuitState::Open => match pair.opened_at {
                Some(opened_at) if now.duration_since(opened_at) < self.cooldown => {
                    CircuitState::Open
                }
                _ => CircuitState::Closed,
            },
            _ => CircuitState::Closed,
        }
    }

    /// Force-close a pair's circuit and clear its window and correlation
    /// bookkeeping, regardless of cooldown.
    pub fn reset_circuit(&self, a: &str, b: &str) {
        let key = PairKey::new(a, b);
        self.pairs.remove(&key);
        self.correlations.retain(|(pair, _), _| pair != &key);
    }

    /// Drop all pair and correlation state.
    pub fn clear(&self) {
        self.pairs.clear();
        self.correlations.clear();
    }

    /// Number of pairs currently tracked (diagnostic).
    pub fn tracked_pairs(&self) -> usize {
        self.pairs.len()
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("max_pair_messages_per_window", &self.max_pair_messages_per_window)
            .field("window", &self.window)
            .field("cooldown", &self.cooldown)
            .field("max_correlation_depth", &self.max_correlation_depth)
            .field("tracked_pairs", &self.pairs.len())
            .field("tracked_correlations", &self.correlations.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
