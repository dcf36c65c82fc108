//! Observability metrics for throttling.
//!
//! Provides counters about throttling behavior for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking throttling statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total number of actions allowed
    actions_allowed: AtomicU64,
    /// Total number of actions throttled
    actions_throttled: AtomicU64,
    /// Number of windows opened (first use of a key or reset after a lapse)
    windows_opened: AtomicU64,
    /// Number of entries removed by purges
    keys_purged: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                actions_allowed: AtomicU64::new(0),
                actions_throttled: AtomicU64::new(0),
                windows_opened: AtomicU64::new(0),
                keys_purged: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.actions_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttled(&self) {
        self.inner.actions_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_window_opened(&self) {
        self.inner.windows_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, count: u64) {
        self.inner.keys_purged.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the total number of actions allowed.
    pub fn actions_allowed(&self) -> u64 {
        self.inner.actions_allowed.load(Ordering::Relaxed)
    }

    /// Get the total number of actions throttled.
    pub fn actions_throttled(&self) -> u64 {
        self.inner.actions_throttled.load(Ordering::Relaxed)
    }

    /// Get the number of windows opened.
    pub fn windows_opened(&self) -> u64 {
        self.inner.windows_opened.load(Ordering::Relaxed)
    }

    /// Get the number of entries removed by purges.
    pub fn keys_purged(&self) -> u64 {
        self.inner.keys_purged.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            actions_allowed: self.actions_allowed(),
            actions_throttled: self.actions_throttled(),
            windows_opened: self.windows_opened(),
            keys_purged: self.keys_purged(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub actions_allowed: u64,
    pub actions_throttled: u64,
    pub windows_opened: u64,
    pub keys_purged: u64,
}

impl MetricsSnapshot {
    /// Ratio of throttled actions to all actions (0.0 to 1.0).
    ///
    /// Returns 0.0 if no actions have been checked.
    pub fn throttle_rate(&self) -> f64 {
        let total = self.total_actions();
        if total == 0 {
            0.0
        } else {
            self.actions_throttled as f64 / total as f64
        }
    }

    /// Get the total number of actions checked (allowed + throttled).
    pub fn total_actions(&self) -> u64 {
        self.actions_allowed.saturating_add(self.actions_throttled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.actions_allowed(), 0);
        assert_eq!(metrics.actions_throttled(), 0);
        assert_eq!(metrics.windows_opened(), 0);
        assert_eq!(metrics.keys_purged(), 0);
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_allowed();
        metrics.record_throttled();
        metrics.record_window_opened();
        metrics.record_purged(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.actions_allowed, 2);
        assert_eq!(snapshot.actions_throttled, 1);
        assert_eq!(snapshot.windows_opened, 1);
        assert_eq!(snapshot.keys_purged, 4);
        assert_eq!(snapshot.total_actions(), 3);
    }

    #[test]
    fn test_throttle_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().throttle_rate(), 0.0);

        metrics.record_allowed();
        metrics.record_throttled();
        assert!((metrics.snapshot().throttle_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_throttled();
        metrics.record_throttled();
        assert!((metrics.snapshot().throttle_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.record_allowed();
        assert_eq!(metrics.actions_allowed(), 1);

        metrics.record_throttled();
        assert_eq!(clone.actions_throttled(), 1);
    }
}
