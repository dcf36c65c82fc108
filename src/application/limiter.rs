//! Rate limiter coordination logic.
//!
//! The rate limiter decides whether a keyed action may proceed, based on the
//! window policy, and keeps metrics about its decisions.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::application::registry::ThrottleRegistry;
use crate::domain::policy::{ThrottleDecision, ThrottleEntry, WindowMode, WindowPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Keyed action throttle.
///
/// Clones share the same state, so one limiter can be handed to every
/// request handler. Separate limiters (for example one per test) are fully
/// isolated from each other.
#[derive(Debug, Clone)]
pub struct RateLimiter<S>
where
    S: Storage<String, ThrottleEntry> + Clone,
{
    registry: ThrottleRegistry<S>,
    policy: WindowPolicy,
    metrics: Metrics,
}

impl<S> RateLimiter<S>
where
    S: Storage<String, ThrottleEntry> + Clone,
{
    /// Create a new rate limiter.
    ///
    /// # Arguments
    /// * `registry` - The throttle registry (which contains the clock)
    /// * `policy` - Limit, window and mode used by `check_and_consume`
    /// * `metrics` - Metrics tracker
    pub fn from_parts(
        registry: ThrottleRegistry<S>,
        policy: WindowPolicy,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            policy,
            metrics,
        }
    }

    /// Record an action for `key` under the configured policy.
    ///
    /// Returns `true` if the action may proceed.
    pub fn check_and_consume(&self, key: &str) -> bool {
        self.check(key).is_allow()
    }

    /// Record an action for `key` with an explicit limit and window.
    ///
    /// The configured window mode still applies. Arguments are not
    /// validated: a zero `limit` throttles everything after the action that
    /// opens a window.
    pub fn check_and_consume_with(&self, key: &str, limit: u32, window: Duration) -> bool {
        self.check_with(key, limit, window).is_allow()
    }

    /// Record an action for `key` under the configured policy.
    pub fn check(&self, key: &str) -> ThrottleDecision {
        self.decide(key, &self.policy)
    }

    /// Record an action for `key` with an explicit limit and window.
    pub fn check_with(&self, key: &str, limit: u32, window: Duration) -> ThrottleDecision {
        let policy = WindowPolicy::new(limit, window, self.policy.mode);
        self.decide(key, &policy)
    }

    fn decide(&self, key: &str, policy: &WindowPolicy) -> ThrottleDecision {
        let (decision, window_opened, count) =
            self.registry.with_entry(key, policy.window, |entry, now, created| {
                if created {
                    return (ThrottleDecision::Allow, true, entry.count());
                }
                let registration = entry.register(now, policy);
                (registration.decision, registration.window_reset, entry.count())
            });

        if window_opened {
            self.metrics.record_window_opened();
            debug!(limit = policy.limit, "throttle window opened");
        }

        match decision {
            ThrottleDecision::Allow => self.metrics.record_allowed(),
            ThrottleDecision::Throttle => self.metrics.record_throttled(),
        }

        trace!(?decision, count, limit = policy.limit, "throttle check");
        decision
    }

    /// Remove every tracked key.
    ///
    /// The next action for any key behaves like its first.
    pub fn clear_all(&self) {
        let removed = self.registry.len();
        self.registry.clear();
        debug!(removed, "cleared all throttle state");
    }

    /// Remove keys whose window has lapsed.
    ///
    /// An entry is tested against the longer of the configured window and
    /// the window its latest action used, so keys recorded through
    /// `check_with` with a longer window survive until that window lapses.
    /// A purged key would be reopened on its next action with either window,
    /// so purging only bounds memory. Returns the number of keys removed.
    pub fn purge_expired(&self) -> usize {
        let configured = self.policy.window;
        let mut removed = 0;

        self.registry.cleanup(|_key, entry, now| {
            let keep = !entry.is_expired(now, entry.window().max(configured));
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }

    /// The policy applied by `check_and_consume`.
    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// The configured window mode.
    pub fn window_mode(&self) -> WindowMode {
        self.policy.mode
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The clock driving window arithmetic.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.registry.clock()
    }
}
