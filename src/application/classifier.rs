//! Clock-aware age classification.
//!
//! The domain functions take "today" explicitly. `AgeClassifier` reads it
//! from the `Clock` port so request handlers don't, and tests can freeze it.

use crate::application::ports::Clock;
use crate::domain::age::{age_from_birthdate, parse_birthdate, Age, AgeBand, AgeError};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Computes ages and bands relative to a clock's current date.
#[derive(Debug, Clone)]
pub struct AgeClassifier {
    clock: Arc<dyn Clock>,
}

impl AgeClassifier {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Age today of a child born on `birthdate`.
    pub fn age_of(&self, birthdate: NaiveDate) -> Age {
        age_from_birthdate(birthdate, self.clock.today())
    }

    /// Band today of a child born on `birthdate`.
    pub fn band_of(&self, birthdate: NaiveDate) -> AgeBand {
        self.age_of(birthdate).band()
    }

    /// Band for a child profile.
    ///
    /// A stored band id that parses wins. Otherwise the band is derived from
    /// the birthday string, if there is one. Returns `Ok(None)` when neither
    /// is usable, and an error only for a birthday that does not parse.
    pub fn effective_band(
        &self,
        stored_band: Option<&str>,
        birthday: Option<&str>,
    ) -> Result<Option<AgeBand>, AgeError> {
        if let Some(band) = stored_band.and_then(|id| id.parse::<AgeBand>().ok()) {
            return Ok(Some(band));
        }

        match birthday.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let band = self.band_of(parse_birthdate(raw)?);
                debug!(band = band.id(), "derived age band from birthday");
                Ok(Some(band))
            }
            None => Ok(None),
        }
    }

    /// Month count used to match products against a child profile.
    ///
    /// A non-empty birthday wins over the stored month count. With neither
    /// the child counts as 0 months old.
    pub fn child_age_months(
        &self,
        birthday: Option<&str>,
        stored_age_months: Option<i32>,
    ) -> Result<i32, AgeError> {
        match birthday.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(self.age_of(parse_birthdate(raw)?).total_months),
            None => Ok(stored_age_months.unwrap_or(0)),
        }
    }
}
