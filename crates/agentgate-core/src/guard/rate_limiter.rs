//! Per-sender fixed-window rate limiting.
//!
//! Counts messages in discrete, non-overlapping windows anchored at the
//! sender's first message in the current window. State lives in a `DashMap`
//! so checks for different senders never contend; each check is a single
//! entry-level read-modify-write, which makes same-sender checks atomic.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use agentgate_types::config::RateLimiterConfig;

/// Answer to one quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Quota left in the current window after accounting for this message.
    pub remaining: u32,
}

/// Counting window for one sender.
#[derive(Debug)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window per-sender quota tracker.
///
/// Entries are created lazily on first check and replaced (not incremented)
/// once their window expires. Nothing is persisted; restart clears all
/// counters.
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    entries: DashMap<String, WindowEntry>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            max_per_window: config.max_per_window,
            window: config.window,
            entries: DashMap::new(),
        }
    }

    /// Check and count one message from `agent_id` at the current time.
    pub fn check(&self, agent_id: &str) -> RateDecision {
        self.check_at(agent_id, Instant::now())
    }

    /// Check and count one message from `agent_id` at an explicit time.
    ///
    /// The entry lock is held only for the counting decision.
    pub fn check_at(&self, agent_id: &str, now: Instant) -> RateDecision {
        let mut entry = self
            .entries
            .entry(agent_id.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                window_start: now,
            });
        let window = entry.value_mut();

        // A stale window is replaced wholesale, not rolled over.
        if now.duration_since(window.window_start) >= self.window {
            window.count = 0;
            window.window_start = now;
        }

        if window.count < self.max_per_window {
            window.count += 1;
            RateDecision {
                allowed: true,
                remaining: self.max_per_window - window.count,
            }
        } else {
            RateDecision {
                allowed: false,
                remaining: 0,
            }
        }
    }

    /// Drop the window for one sender.
    pub fn reset(&self, agent_id: &str) {
        self.entries.remove(agent_id);
    }

    /// Drop all windows.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Garbage-collect expired windows. Never required for correctness,
    /// only for memory bounds.
    pub fn prune(&self, now: Instant) {
        self.entries
            .retain(|_, window| now.duration_since(window.window_start) < self.window);
    }

    /// Number of senders currently tracked (diagnostic).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_per_window", &self.max_per_window)
            .field("window", &self.window)
            .field("tracked_senders", &self.entries.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
