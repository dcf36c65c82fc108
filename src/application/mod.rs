//! Application layer - orchestration of domain logic.
//!
//! - Age classifier (ages and bands relative to the clock's date)
//! - Throttle registry (keyed window state behind the storage port)
//! - Rate limiter (check-and-consume, clear, purge)
//! - Throttled mailer (sends account emails only when the limiter permits)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters implement: `Clock`, `Storage` and `Mailer`.

pub mod classifier;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod ports;
pub mod registry;
