//! Free-text billing period labels ("January 2025", "jan 2025 rent", ...)

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PeriodError;
use crate::key::PeriodKey;
use crate::month::Month;

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("valid year regex"));

/// Strip punctuation around a token ("January," -> "January")
fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Parse a payment period label into a period key.
///
/// The first token names the month; the year is the first later token made of
/// exactly four digits. Anything else is rejected rather than guessed.
pub fn parse_label(label: &str) -> Result<PeriodKey, PeriodError> {
    let tokens: Vec<&str> = label
        .split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() < 2 {
        return Err(PeriodError::malformed(label, "expected a month and a year"));
    }

    let month = Month::from_token(tokens[0])
        .ok_or_else(|| PeriodError::malformed(label, "first token is not a month name"))?;

    let year = tokens[1..]
        .iter()
        .find(|t| YEAR_TOKEN.is_match(t))
        .and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| PeriodError::malformed(label, "no four-digit year found"))?;

    Ok(PeriodKey::new(month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_label() {
        let key = parse_label("January 2025").unwrap();
        assert_eq!(key, PeriodKey::new(Month::January, 2025));
    }

    #[test]
    fn test_parse_case_and_punctuation() {
        assert_eq!(parse_label("march, 2024").unwrap(), PeriodKey::new(Month::March, 2024));
        assert_eq!(parse_label("  DEC   2023 ").unwrap(), PeriodKey::new(Month::December, 2023));
    }

    #[test]
    fn test_parse_year_after_extra_words() {
        let key = parse_label("June rent 2025 unit 4B").unwrap();
        assert_eq!(key, PeriodKey::new(Month::June, 2025));
    }

    #[test]
    fn test_parse_rejects_single_token() {
        let err = parse_label("2025").unwrap_err();
        assert!(matches!(err, PeriodError::MalformedLabel { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_year() {
        assert!(parse_label("January rent").is_err());
        assert!(parse_label("January 25").is_err());
        assert!(parse_label("January 20251").is_err());
    }

    #[test]
    fn test_parse_rejects_numeric_month() {
        // "1" must not be read as January
        assert!(parse_label("1 2025").is_err());
        assert!(parse_label("2025 January").is_err());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_label("").is_err());
        assert!(parse_label("   ").is_err());
    }
}
