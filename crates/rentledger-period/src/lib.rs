//! Billing period resolution
//!
//! Payments carry a free-text period label while expenses carry a calendar
//! date. Both resolve into the same [`PeriodKey`] space so that a payment for
//! "January 2025" and an expense dated 2025-01-15 land in the same summary.

use chrono::NaiveDate;

pub mod error;
pub mod key;
pub mod label;
pub mod month;

pub use error::PeriodError;
pub use key::PeriodKey;
pub use label::parse_label;
pub use month::Month;

/// Anything that can be resolved into a reporting period
#[derive(Debug, Clone, Copy)]
pub enum PeriodSource<'a> {
    /// Free-text payment period label
    Label(&'a str),
    /// Calendar date of an expense
    Date(NaiveDate),
}

/// Resolve a label or date into its canonical period
pub fn resolve(source: PeriodSource<'_>) -> Result<PeriodKey, PeriodError> {
    match source {
        PeriodSource::Label(label) => parse_label(label),
        PeriodSource::Date(date) => Ok(PeriodKey::from_date(date)),
    }
}

/// Build a period from a month token and a year, as entered on the admin form
pub fn period_for(month: &str, year: i32) -> Result<PeriodKey, PeriodError> {
    if !(1000..=9999).contains(&year) {
        return Err(PeriodError::YearOutOfRange { year });
    }
    let month: Month = month.parse()?;
    Ok(PeriodKey::new(month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_date_resolve_equal() {
        let from_label = resolve(PeriodSource::Label("January 2025")).unwrap();
        let from_date = resolve(PeriodSource::Date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())).unwrap();
        assert_eq!(from_label, from_date);
    }

    #[test]
    fn test_every_month_round_trips_through_label() {
        for month in Month::ALL {
            let date = NaiveDate::from_ymd_opt(2030, month.number(), 28).unwrap();
            let key = resolve(PeriodSource::Date(date)).unwrap();
            assert_eq!(resolve(PeriodSource::Label(&key.label())).unwrap(), key);
        }
    }

    #[test]
    fn test_period_for() {
        assert_eq!(period_for("december", 2099).unwrap(), PeriodKey::new(Month::December, 2099));
        assert!(matches!(period_for("Decembre", 2099), Err(PeriodError::UnknownMonth { .. })));
        assert!(matches!(period_for("May", 99), Err(PeriodError::YearOutOfRange { year: 99 })));
    }
}
