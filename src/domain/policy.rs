//! Throttle window policy and per-key window state.
//!
//! A key may perform `limit` actions per window. The window starts on the
//! first action for the key and lapses once more than `window` has passed
//! since `window_start`. Lapsed windows are reset lazily, on the next action.

use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of actions permitted per window.
pub const DEFAULT_LIMIT: u32 = 3;

/// Default window length (five minutes).
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300_000);

/// Decision made for a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// The action may proceed
    Allow,
    /// The action exceeded the limit for the current window
    Throttle,
}

impl ThrottleDecision {
    /// Check if this decision is Allow.
    pub fn is_allow(&self) -> bool {
        matches!(self, ThrottleDecision::Allow)
    }

    /// Check if this decision is Throttle.
    pub fn is_throttle(&self) -> bool {
        matches!(self, ThrottleDecision::Throttle)
    }
}

/// How `window_start` moves while a window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowMode {
    /// Every in-window action moves `window_start` to now.
    ///
    /// Steady traffic with gaps shorter than the window keeps the window
    /// open indefinitely; only a quiet gap longer than the window resets it.
    #[default]
    Rolling,
    /// `window_start` stays anchored at the action that opened the window.
    Fixed,
}

/// Limit, window length and window mode applied to every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Maximum actions per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
    /// Rolling or fixed window
    pub mode: WindowMode,
}

impl WindowPolicy {
    /// Create a policy.
    ///
    /// No validation is done here. A zero `limit` throttles every action
    /// after the one that opens a window.
    pub fn new(limit: u32, window: Duration, mode: WindowMode) -> Self {
        Self {
            limit,
            window,
            mode,
        }
    }

    /// Create a rolling-window policy.
    pub fn rolling(limit: u32, window: Duration) -> Self {
        Self::new(limit, window, WindowMode::Rolling)
    }

    /// Create a fixed-window policy.
    pub fn fixed(limit: u32, window: Duration) -> Self {
        Self::new(limit, window, WindowMode::Fixed)
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::rolling(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

/// Result of registering one action against an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Whether the action is allowed
    pub decision: ThrottleDecision,
    /// Whether this action opened a new window
    pub window_reset: bool,
}

/// Window state tracked for one key.
///
/// The entry remembers the window length of its latest action, since
/// per-call overrides may differ from the limiter's configured window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleEntry {
    count: u32,
    window_start: Instant,
    window: Duration,
}

impl ThrottleEntry {
    /// Entry for the first action seen for a key.
    pub fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            window,
        }
    }

    /// Actions counted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Start of the current window.
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// Window length applied by the latest action.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether more than `window` has passed since the window started.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }

    /// Register an action at `now` under `policy`.
    ///
    /// A lapsed window is reopened and the action allowed regardless of the
    /// previous count. Otherwise the count grows by one and the action is
    /// allowed while the count stays within the limit.
    pub fn register(&mut self, now: Instant, policy: &WindowPolicy) -> Registration {
        if self.is_expired(now, policy.window) {
            *self = Self::open(now, policy.window);
            return Registration {
                decision: ThrottleDecision::Allow,
                window_reset: true,
            };
        }

        self.count = self.count.saturating_add(1);
        self.window = policy.window;
        if policy.mode == WindowMode::Rolling {
            self.window_start = now;
        }

        let decision = if self.count <= policy.limit {
            ThrottleDecision::Allow
        } else {
            ThrottleDecision::Throttle
        };

        Registration {
            decision,
            window_reset: false,
        }
    }
}
