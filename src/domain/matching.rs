//! Matching children to age-appropriate products.
//!
//! Products state their ages either as precise month bounds or as free text
//! such as `"0-1y"`, `"18m"` or `"3-5 years"`. Month bounds win when both
//! are present. Every range is inclusive at both ends.

use crate::domain::age::AgeBand;
use once_cell::sync::Lazy;
use regex::Regex;

/// First number in a range part, with an optional month or year unit.
static AGE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(m|months?|y|years?)?").expect("age value pattern is valid")
});

/// Inclusive age range in years. Bounds may be fractional (`1.5` is 18 months).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearRange {
    pub min: f64,
    pub max: f64,
}

impl YearRange {
    /// Assumed for products with no stated range.
    pub const ANY_AGE: YearRange = YearRange::new(0.0, 99.0);

    /// Assumed for an unknown band identifier.
    pub const CHILDHOOD: YearRange = YearRange::new(0.0, 18.0);

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether `years` lies within the range, bounds included.
    pub fn contains(&self, years: f64) -> bool {
        years >= self.min && years <= self.max
    }
}

/// Nicknames for the developmental stage a band is in, and the one it is
/// moving towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageNicknames {
    pub current: &'static str,
    pub shift: &'static str,
}

impl StageNicknames {
    /// Used for unknown band identifiers.
    pub const FALLBACK: StageNicknames = StageNicknames::new("Explorer", "Learner");

    const fn new(current: &'static str, shift: &'static str) -> Self {
        Self { current, shift }
    }
}

impl AgeBand {
    /// Years of product age this band browses.
    ///
    /// Unlike the month bands these ranges overlap.
    pub fn year_range(&self) -> YearRange {
        let (min, max) = match self {
            AgeBand::NewbornTo18Months => (0.0, 1.5),
            AgeBand::EighteenMonthsTo3Years => (1.5, 3.0),
            AgeBand::TwoToFive => (2.0, 5.0),
            AgeBand::ThreeToSix => (3.0, 6.0),
            AgeBand::FourToSeven => (4.0, 7.0),
            AgeBand::FiveToEight => (5.0, 8.0),
            AgeBand::SixToNine => (6.0, 9.0),
            AgeBand::SevenToTen => (7.0, 10.0),
            AgeBand::EightToEleven => (8.0, 11.0),
            AgeBand::NineToTwelve => (9.0, 12.0),
            AgeBand::TenToEarlyTeens => (10.0, 13.0),
            AgeBand::PreteensToOlderTeens => (11.0, 17.0),
        };
        YearRange::new(min, max)
    }

    /// Stage nicknames shown on the child profile.
    pub fn stage(&self) -> StageNicknames {
        match self {
            AgeBand::NewbornTo18Months => {
                StageNicknames::new("Sensory Being", "Independent Explorer")
            }
            AgeBand::EighteenMonthsTo3Years => {
                StageNicknames::new("Physical Explorer", "Budding Storyteller")
            }
            AgeBand::TwoToFive => StageNicknames::new("Eager Imitator", "Imaginative Creator"),
            AgeBand::ThreeToSix => StageNicknames::new("Magical Thinker", "Early Planner"),
            AgeBand::FourToSeven => StageNicknames::new("Enthusiastic Friend", "Rule-Follower"),
            AgeBand::FiveToEight => StageNicknames::new("Imaginative Player", "Skill Master"),
            AgeBand::SixToNine => {
                StageNicknames::new("Concrete Thinker", "Strategic Problem-Solver")
            }
            AgeBand::SevenToTen => StageNicknames::new("Competent Peer", "Independent Expert"),
            AgeBand::EightToEleven => StageNicknames::new("Team Player", "Budding Individual"),
            AgeBand::NineToTwelve => StageNicknames::new("Rule Master", "Abstract Thinker"),
            AgeBand::TenToEarlyTeens => StageNicknames::new("Confident Peer", "Identity Seeker"),
            AgeBand::PreteensToOlderTeens => {
                StageNicknames::new("Emerging Individual", "Young Adult")
            }
        }
    }
}

/// Year range for a band identifier, `0..=18` when unknown.
pub fn year_range_for(id: &str) -> YearRange {
    id.parse::<AgeBand>()
        .map_or(YearRange::CHILDHOOD, |band| band.year_range())
}

/// Stage nicknames for a band identifier, [`StageNicknames::FALLBACK`] when
/// unknown.
pub fn stage_for(id: &str) -> StageNicknames {
    id.parse::<AgeBand>()
        .map_or(StageNicknames::FALLBACK, |band| band.stage())
}

/// Parse a free-text product age range into years.
///
/// `"a-b"` gives both bounds; anything else is read as a single age used
/// for both. Values in months (`m`, `month`, `months`) are converted to
/// years; a bare number is in years. A part with no number reads as 0. A
/// missing or empty range is [`YearRange::ANY_AGE`].
pub fn parse_age_range(range: Option<&str>) -> YearRange {
    let Some(range) = range.filter(|r| !r.is_empty()) else {
        return YearRange::ANY_AGE;
    };

    let parts: Vec<&str> = range.split('-').collect();
    if let [min, max] = parts.as_slice() {
        return YearRange::new(parse_age_value(min.trim()), parse_age_value(max.trim()));
    }

    let single = parse_age_value(range);
    YearRange::new(single, single)
}

fn parse_age_value(value: &str) -> f64 {
    let Some(caps) = AGE_VALUE.captures(value) else {
        return 0.0;
    };

    let amount: f64 = caps[1].parse().unwrap_or(0.0);
    match caps.get(2) {
        Some(unit) if unit.as_str().to_ascii_lowercase().starts_with('m') => amount / 12.0,
        _ => amount,
    }
}

/// Age information attached to a product.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProductAges<'a> {
    /// Youngest suitable age in months
    pub min_age_months: Option<i32>,
    /// Oldest suitable age in months
    pub max_age_months: Option<i32>,
    /// Free-text range, e.g. `"2-4y"`
    pub age_range: Option<&'a str>,
}

impl ProductAges<'_> {
    /// Check whether a child of `child_age_months` fits this product.
    ///
    /// Uses the month bounds when both are set, otherwise the free-text
    /// range compared against the child's age in fractional years.
    pub fn fits(&self, child_age_months: i32) -> bool {
        match (self.min_age_months, self.max_age_months) {
            (Some(min), Some(max)) => (min..=max).contains(&child_age_months),
            _ => parse_age_range(self.age_range).contains(f64::from(child_age_months) / 12.0),
        }
    }
}
