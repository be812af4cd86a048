//! Calendar months in the fixed English (Gregorian) name space

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// Month of the year. Ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All months, January first
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month from its calendar number (1-12)
    pub fn from_number(number: u32) -> Option<Month> {
        if (1..=12).contains(&number) {
            Some(Self::ALL[(number - 1) as usize])
        } else {
            None
        }
    }

    /// Calendar number (1-12)
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Canonical English name
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Match a single token against full names and standard abbreviations.
    ///
    /// Only whole-token matches count: "Jan" and "JANUARY" resolve, "Janu" and "1" do not.
    pub fn from_token(token: &str) -> Option<Month> {
        let lower = token.to_ascii_lowercase();
        let month = match lower.as_str() {
            "january" | "jan" => Month::January,
            "february" | "feb" => Month::February,
            "march" | "mar" => Month::March,
            "april" | "apr" => Month::April,
            "may" => Month::May,
            "june" | "jun" => Month::June,
            "july" | "jul" => Month::July,
            "august" | "aug" => Month::August,
            "september" | "sep" | "sept" => Month::September,
            "october" | "oct" => Month::October,
            "november" | "nov" => Month::November,
            "december" | "dec" => Month::December,
            _ => return None,
        };
        Some(month)
    }
}

impl std::str::FromStr for Month {
    type Err = PeriodError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::from_token(s.trim()).ok_or_else(|| PeriodError::UnknownMonth {
            token: s.to_string(),
        })
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_numbers() {
        assert_eq!(Month::January.number(), 1);
        assert_eq!(Month::December.number(), 12);
        assert_eq!(Month::from_number(9), Some(Month::September));
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
    }

    #[test]
    fn test_month_from_token() {
        assert_eq!(Month::from_token("january"), Some(Month::January));
        assert_eq!(Month::from_token("JAN"), Some(Month::January));
        assert_eq!(Month::from_token("Sept"), Some(Month::September));
        assert_eq!(Month::from_token("Janu"), None);
        assert_eq!(Month::from_token("1"), None);
        assert_eq!(Month::from_token(""), None);
    }

    #[test]
    fn test_month_from_str_error() {
        let err = "Smarch".parse::<Month>().unwrap_err();
        assert_eq!(err, PeriodError::UnknownMonth { token: "Smarch".to_string() });
    }

    #[test]
    fn test_month_ordering() {
        assert!(Month::January < Month::February);
        assert!(Month::November < Month::December);
    }
}
