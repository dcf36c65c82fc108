//! Builder for the in-memory rate limiter.

use crate::application::{
    limiter::RateLimiter, metrics::Metrics, ports::Clock, registry::ThrottleRegistry,
};
use crate::domain::policy::{ThrottleEntry, WindowMode, WindowPolicy};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::ThrottleConfig;
use crate::infrastructure::storage::ShardedStorage;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Storage used by limiters built here.
pub type SharedStorage = Arc<ShardedStorage<String, ThrottleEntry>>;

/// Error returned when building a `RateLimiter` fails.
///
/// Only configured defaults are validated. Per-call overrides passed to
/// `check_and_consume_with` are taken as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Limit must be greater than zero
    ZeroLimit,
    /// Window must be longer than zero
    ZeroWindow,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroLimit => write!(f, "limit must be greater than 0"),
            BuildError::ZeroWindow => write!(f, "window must be longer than 0"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for constructing a `RateLimiter`.
#[derive(Debug)]
pub struct RateLimiterBuilder {
    policy: WindowPolicy,
    clock: Option<Arc<dyn Clock>>,
    capacity: Option<usize>,
}

impl RateLimiterBuilder {
    fn new() -> Self {
        Self {
            policy: WindowPolicy::default(),
            clock: None,
            capacity: None,
        }
    }

    /// Set the number of actions permitted per window.
    ///
    /// Default: 3
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.policy.limit = limit;
        self
    }

    /// Set the window length.
    ///
    /// Default: 5 minutes
    pub fn with_window(mut self, window: Duration) -> Self {
        self.policy.window = window;
        self
    }

    /// Set how the window start moves while a window is open.
    ///
    /// Default: `WindowMode::Rolling`
    pub fn with_window_mode(mut self, mode: WindowMode) -> Self {
        self.policy.mode = mode;
        self
    }

    /// Set limit, window and mode at once.
    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply a loaded configuration.
    pub fn with_config(self, config: ThrottleConfig) -> Self {
        self.with_policy(config.policy())
    }

    /// Set a custom clock (mainly for tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Pre-size the storage for an expected number of keys.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Build the limiter.
    ///
    /// # Errors
    /// Returns `BuildError` if the limit or the window is zero.
    pub fn build(self) -> Result<RateLimiter<SharedStorage>, BuildError> {
        if self.policy.limit == 0 {
            return Err(BuildError::ZeroLimit);
        }
        if self.policy.window.is_zero() {
            return Err(BuildError::ZeroWindow);
        }

        Ok(assemble(self.policy, self.clock, self.capacity))
    }
}

fn assemble(
    policy: WindowPolicy,
    clock: Option<Arc<dyn Clock>>,
    capacity: Option<usize>,
) -> RateLimiter<SharedStorage> {
    let storage = match capacity {
        Some(capacity) => ShardedStorage::with_capacity(capacity),
        None => ShardedStorage::new(),
    };
    let clock = clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
    let registry = ThrottleRegistry::new(Arc::new(storage), clock);
    RateLimiter::from_parts(registry, policy, Metrics::new())
}

impl RateLimiter<SharedStorage> {
    /// Create a limiter with the defaults: 3 actions per rolling 5-minute
    /// window, system clock.
    pub fn new() -> Self {
        assemble(WindowPolicy::default(), None, None)
    }

    /// Create a builder for configuring the limiter.
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }
}

impl Default for RateLimiter<SharedStorage> {
    fn default() -> Self {
        Self::new()
    }
}
