//! Age arithmetic and age-band classification.
//!
//! Children are bucketed into one of twelve overlapping-by-name but
//! contiguous-by-months bands. Recommendations are matched against the
//! band, so every non-negative month count must land in exactly one band.

use chrono::{DateTime, Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Exclusive upper bounds (in months) for every band except the last.
const BAND_UPPER_BOUNDS: [u32; 11] = [18, 36, 60, 72, 84, 96, 108, 120, 132, 144, 156];

/// A named age bucket used for recommendation matching.
///
/// Variants are ordered from youngest to oldest. Each band covers the
/// half-open interval `[lower, upper)` in months; the last band is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AgeBand {
    /// `newborn-18m`: 0 to 17 months
    #[cfg_attr(feature = "serde", serde(rename = "newborn-18m"))]
    NewbornTo18Months,
    /// `18m-3y`: 18 to 35 months
    #[cfg_attr(feature = "serde", serde(rename = "18m-3y"))]
    EighteenMonthsTo3Years,
    /// `2-5y`: 36 to 59 months
    #[cfg_attr(feature = "serde", serde(rename = "2-5y"))]
    TwoToFive,
    /// `3-6y`: 60 to 71 months
    #[cfg_attr(feature = "serde", serde(rename = "3-6y"))]
    ThreeToSix,
    /// `4-7y`: 72 to 83 months
    #[cfg_attr(feature = "serde", serde(rename = "4-7y"))]
    FourToSeven,
    /// `5-8y`: 84 to 95 months
    #[cfg_attr(feature = "serde", serde(rename = "5-8y"))]
    FiveToEight,
    /// `6-9y`: 96 to 107 months
    #[cfg_attr(feature = "serde", serde(rename = "6-9y"))]
    SixToNine,
    /// `7-10y`: 108 to 119 months
    #[cfg_attr(feature = "serde", serde(rename = "7-10y"))]
    SevenToTen,
    /// `8-11y`: 120 to 131 months
    #[cfg_attr(feature = "serde", serde(rename = "8-11y"))]
    EightToEleven,
    /// `9-12y`: 132 to 143 months
    #[cfg_attr(feature = "serde", serde(rename = "9-12y"))]
    NineToTwelve,
    /// `10-early-teens`: 144 to 155 months
    #[cfg_attr(feature = "serde", serde(rename = "10-early-teens"))]
    TenToEarlyTeens,
    /// `preteens-older-teens`: 156 months and up
    #[cfg_attr(feature = "serde", serde(rename = "preteens-older-teens"))]
    PreteensToOlderTeens,
}

impl AgeBand {
    /// All bands, youngest first.
    pub const ALL: [AgeBand; 12] = [
        AgeBand::NewbornTo18Months,
        AgeBand::EighteenMonthsTo3Years,
        AgeBand::TwoToFive,
        AgeBand::ThreeToSix,
        AgeBand::FourToSeven,
        AgeBand::FiveToEight,
        AgeBand::SixToNine,
        AgeBand::SevenToTen,
        AgeBand::EightToEleven,
        AgeBand::NineToTwelve,
        AgeBand::TenToEarlyTeens,
        AgeBand::PreteensToOlderTeens,
    ];

    /// Stable identifier, as stored alongside child profiles and products.
    pub fn id(&self) -> &'static str {
        match self {
            AgeBand::NewbornTo18Months => "newborn-18m",
            AgeBand::EighteenMonthsTo3Years => "18m-3y",
            AgeBand::TwoToFive => "2-5y",
            AgeBand::ThreeToSix => "3-6y",
            AgeBand::FourToSeven => "4-7y",
            AgeBand::FiveToEight => "5-8y",
            AgeBand::SixToNine => "6-9y",
            AgeBand::SevenToTen => "7-10y",
            AgeBand::EightToEleven => "8-11y",
            AgeBand::NineToTwelve => "9-12y",
            AgeBand::TenToEarlyTeens => "10-early-teens",
            AgeBand::PreteensToOlderTeens => "preteens-older-teens",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::NewbornTo18Months => "Newborn to 18 months",
            AgeBand::EighteenMonthsTo3Years => "18 months to 3 years",
            AgeBand::TwoToFive => "2 to 5 years",
            AgeBand::ThreeToSix => "3 to 6 years",
            AgeBand::FourToSeven => "4 to 7 years",
            AgeBand::FiveToEight => "5 to 8 years",
            AgeBand::SixToNine => "6 to 9 years",
            AgeBand::SevenToTen => "7 to 10 years",
            AgeBand::EightToEleven => "8 to 11 years",
            AgeBand::NineToTwelve => "9 to 12 years",
            AgeBand::TenToEarlyTeens => "10 to Early Teens",
            AgeBand::PreteensToOlderTeens => "Pre-teens to Older Teens",
        }
    }

    /// Month interval covered by this band as `(lower, upper)`.
    ///
    /// `upper` is exclusive and `None` for the last band.
    pub fn month_range(&self) -> (u32, Option<u32>) {
        let index = *self as usize;
        let lower = if index == 0 {
            0
        } else {
            BAND_UPPER_BOUNDS[index - 1]
        };
        (lower, BAND_UPPER_BOUNDS.get(index).copied())
    }

    /// Check whether a month count falls inside this band.
    pub fn contains(&self, total_months: u32) -> bool {
        let (lower, upper) = self.month_range();
        total_months >= lower && upper.map_or(true, |upper| total_months < upper)
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown band identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAgeBandError {
    id: String,
}

impl ParseAgeBandError {
    /// The identifier that failed to parse.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ParseAgeBandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown age band identifier: {:?}", self.id)
    }
}

impl std::error::Error for ParseAgeBandError {}

impl FromStr for AgeBand {
    type Err = ParseAgeBandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeBand::ALL
            .iter()
            .find(|band| band.id() == s)
            .copied()
            .ok_or_else(|| ParseAgeBandError { id: s.to_string() })
    }
}

/// Errors from interpreting user-entered age information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgeError {
    /// The birthdate string was neither `YYYY-MM-DD` nor an RFC 3339 timestamp
    InvalidBirthdate(String),
}

impl fmt::Display for AgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeError::InvalidBirthdate(input) => {
                write!(f, "invalid birthdate: {:?}", input)
            }
        }
    }
}

impl std::error::Error for AgeError {}

/// An age split into calendar years and months.
///
/// `total_months` is always `years * 12 + months`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Age {
    /// Whole calendar years
    pub years: i32,
    /// Remaining months, in `[0, 12)` when derived from a birthdate
    pub months: i32,
    /// Normalized month count
    pub total_months: i32,
}

impl Age {
    /// Build an age from explicit years and months.
    ///
    /// `months` is expected to already be in `[0, 12)`; it is not normalized.
    pub fn new(years: i32, months: i32) -> Self {
        Self {
            years,
            months,
            total_months: months_from_years_and_months(years, months),
        }
    }

    /// Band for this age.
    ///
    /// A negative total (birthdate in the future) falls in the first band.
    pub fn band(&self) -> AgeBand {
        band_for(u32::try_from(self.total_months).unwrap_or(0))
    }
}

/// Convert years plus months into a month count.
///
/// No range check is done on `months`; callers pass a pre-normalized value.
pub fn months_from_years_and_months(years: i32, months: i32) -> i32 {
    years * 12 + months
}

/// Age on `today` of a child born on `birthdate`.
///
/// Only the calendar year and month are compared. When the month
/// difference is negative one year is borrowed. The day of month is
/// ignored, so the result can be one month ahead of the exact age for the
/// days before the monthly birthday.
pub fn age_from_birthdate(birthdate: NaiveDate, today: NaiveDate) -> Age {
    let mut years = today.year() - birthdate.year();
    let mut months = today.month() as i32 - birthdate.month() as i32;

    if months < 0 {
        years -= 1;
        months += 12;
    }

    Age::new(years, months)
}

/// Map a month count to its band.
///
/// Bounds are exclusive: a count equal to a bound belongs to the next band.
pub fn band_for(total_months: u32) -> AgeBand {
    BAND_UPPER_BOUNDS
        .iter()
        .position(|&upper| total_months < upper)
        .map_or(AgeBand::PreteensToOlderTeens, |index| AgeBand::ALL[index])
}

/// Display label for a band identifier.
///
/// Unknown identifiers are returned unchanged.
pub fn label_for(id: &str) -> &str {
    match id.parse::<AgeBand>() {
        Ok(band) => band.label(),
        Err(_) => id,
    }
}

/// Parse a birthdate as stored by the web client.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (the date part is kept).
pub fn parse_birthdate(input: &str) -> Result<NaiveDate, AgeError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| AgeError::InvalidBirthdate(input.to_string()))
}
