//! Error types for rentledger-period

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Malformed period label '{label}': {reason}")]
    MalformedLabel { label: String, reason: String },

    #[error("Unknown month: {token}")]
    UnknownMonth { token: String },

    #[error("Year out of range: {year}")]
    YearOutOfRange { year: i32 },
}

impl PeriodError {
    pub(crate) fn malformed(label: &str, reason: &str) -> Self {
        PeriodError::MalformedLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}
