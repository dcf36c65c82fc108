//! # nursery-guard
//!
//! Age banding and keyed action throttling for the Liza & Toph parenting app.
//!
//! Two independent pieces live here:
//!
//! - **Age classification**: turn a birthdate or an explicit years/months pair
//!   into a month count and one of twelve [`AgeBand`]s used to match
//!   recommendations to a child.
//! - **Throttling**: a [`RateLimiter`] that caps how often a keyed action
//!   (a password-reset email to one address, say) may happen per window.
//!
//! A [`ThrottledMailer`] ties the limiter to an opaque [`Mailer`] for the
//! password-reset and magic-link flows.
//!
//! ## Quick Start
//!
//! ```rust
//! use nursery_guard::{band_for, AgeBand, RateLimiter};
//! use std::time::Duration;
//!
//! assert_eq!(band_for(40), AgeBand::TwoToFive);
//! assert_eq!(AgeBand::TwoToFive.label(), "2 to 5 years");
//!
//! // 3 actions per rolling 5-minute window, per key
//! let limiter = RateLimiter::new();
//! assert!(limiter.check_and_consume("reset_jane@example.com"));
//!
//! // Or configure it
//! let limiter = RateLimiter::builder()
//!     .with_limit(5)
//!     .with_window(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//! # let _ = limiter;
//! ```
//!
//! ## Age Bands
//!
//! Bands are half-open month intervals. A month count equal to a bound belongs
//! to the next band:
//!
//! ```rust
//! use nursery_guard::{band_for, label_for, AgeBand};
//!
//! assert_eq!(band_for(17), AgeBand::NewbornTo18Months);
//! assert_eq!(band_for(18), AgeBand::EighteenMonthsTo3Years);
//! assert_eq!(band_for(156), AgeBand::PreteensToOlderTeens);
//!
//! // Unknown ids pass through unchanged
//! assert_eq!(label_for("10-early-teens"), "10 to Early Teens");
//! assert_eq!(label_for("newborn-2"), "newborn-2");
//! ```
//!
//! Ages from birthdates only compare calendar year and month; the day of
//! month is ignored:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use nursery_guard::age_from_birthdate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let birth = NaiveDate::from_ymd_opt(2021, 8, 20).unwrap();
//! let age = age_from_birthdate(birth, today);
//! assert_eq!((age.years, age.months, age.total_months), (2, 10, 34));
//! ```
//!
//! Products are matched by their month bounds, or failing that by a
//! free-text range in years:
//!
//! ```rust
//! use nursery_guard::{stage_for, ProductAges};
//!
//! let cups = ProductAges {
//!     min_age_months: Some(0),
//!     max_age_months: Some(12),
//!     age_range: None,
//! };
//! assert!(cups.fits(12));
//!
//! let blocks = ProductAges {
//!     age_range: Some("2-4y"),
//!     ..Default::default()
//! };
//! assert!(!blocks.fits(18));
//!
//! assert_eq!(stage_for("3-6y").current, "Magical Thinker");
//! ```
//!
//! ## Throttle Windows
//!
//! For each key the first action opens a window and is allowed. Later
//! actions in the window are counted and allowed while the count stays within
//! the limit. Once more than the window length passes since the window start,
//! the next action reopens the window and is allowed, whatever the old count.
//!
//! - [`WindowMode::Rolling`] (default): every in-window action moves the
//!   window start to now, so steady traffic keeps the window open.
//! - [`WindowMode::Fixed`]: the window start stays at the opening action.
//!
//! ## Memory
//!
//! Entries are never dropped automatically. Call
//! [`RateLimiter::purge_expired`] periodically to drop keys whose window has
//! lapsed, or [`RateLimiter::clear_all`] to drop everything.

// Domain layer - pure types and rules
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

pub use domain::{
    age::{
        age_from_birthdate, band_for, label_for, months_from_years_and_months, parse_birthdate,
        Age, AgeBand, AgeError, ParseAgeBandError,
    },
    email::{
        magic_link_email, password_reset_email, recipient_hash, AppLinks, EmailKind, MailError,
        OutgoingEmail, SendReceipt, LOCAL_BASE_URL,
    },
    matching::{
        parse_age_range, stage_for, year_range_for, ProductAges, StageNicknames, YearRange,
    },
    policy::{
        Registration, ThrottleDecision, ThrottleEntry, WindowMode, WindowPolicy, DEFAULT_LIMIT,
        DEFAULT_WINDOW,
    },
};

pub use application::{
    classifier::AgeClassifier,
    limiter::RateLimiter,
    mailer::{Delivery, ThrottledMailer},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Mailer, Storage},
    registry::ThrottleRegistry,
};

pub use infrastructure::{
    builder::{BuildError, RateLimiterBuilder, SharedStorage},
    clock::SystemClock,
    config::{ConfigError, LinkConfig, ThrottleConfig},
    storage::ShardedStorage,
};
