//! Domain layer - pure types and rules with no I/O.
//!
//! - Age arithmetic and age-band classification
//! - Product age ranges, band year ranges and stage nicknames
//! - Throttle window policy and per-key window state
//! - Outgoing email types and the privacy-safe recipient hash
//!
//! All types in this layer are deterministic given explicit inputs.

pub mod age;
pub mod email;
pub mod matching;
pub mod policy;
