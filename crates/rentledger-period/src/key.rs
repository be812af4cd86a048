//! Canonical (month, year) reporting period

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;
use crate::month::Month;

/// One reporting cycle.
///
/// Field order matters: the derived ordering sorts by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Month,
}

impl PeriodKey {
    pub fn new(month: Month, year: i32) -> Self {
        Self { year, month }
    }

    /// Period containing a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        // month() is always 1-12 for a valid NaiveDate
        let month = Month::from_number(date.month()).unwrap_or(Month::January);
        Self {
            year: date.year(),
            month,
        }
    }

    /// First day of the period
    pub fn first_day(&self) -> Result<NaiveDate, PeriodError> {
        NaiveDate::from_ymd_opt(self.year, self.month.number(), 1)
            .ok_or(PeriodError::YearOutOfRange { year: self.year })
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: &NaiveDate) -> bool {
        PeriodKey::from_date(*date) == *self
    }

    /// Human label in the same shape tenants are billed with, e.g. "January 2025"
    pub fn label(&self) -> String {
        format!("{} {}", self.month.name(), self.year)
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}
