//! Mock clock for testing.

use crate::application::ports::Clock;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling deterministic
/// testing of throttle windows and age calculations. The instant and the
/// calendar date are set independently.
///
/// # Examples
///
/// ```
/// use nursery_guard::infrastructure::mocks::MockClock;
/// use nursery_guard::application::ports::Clock;
/// use chrono::NaiveDate;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), start + Duration::from_secs(10));
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// clock.set_today(today);
/// assert_eq!(clock.today(), today);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time, so advancing time in one
/// clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Instant>>,
    current_date: Arc<Mutex<NaiveDate>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    ///
    /// The calendar date starts at 2024-01-01.
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
            current_date: Arc::new(Mutex::new(default_date())),
        }
    }

    /// Create a mock clock frozen on a calendar date.
    pub fn on_date(today: NaiveDate) -> Self {
        let clock = Self::new(Instant::now());
        clock.set_today(today);
        clock
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = instant;
    }

    /// Set the calendar date returned by `today()`.
    pub fn set_today(&self, today: NaiveDate) {
        let mut date = self
            .current_date
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *date = today;
    }
}

fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }

    fn today(&self) -> NaiveDate {
        *self
            .current_date
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}
