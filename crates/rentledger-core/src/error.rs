//! Error types for rentledger-core
//!
//! Errors local to a single fact (a malformed period label) are reported per
//! record and never abort a batch. Write-path errors propagate to whoever asked
//! for the reconciliation, but never into the payment write that triggered it.

use rentledger_period::PeriodError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Period label cannot be parsed into (month, year)
    MalformedPeriodLabel,
    /// Month/year pair supplied by a caller is invalid
    InvalidPeriod,
    /// Tax rate is negative, non-finite or non-numeric
    InvalidTaxRate,
    /// Amount is negative or otherwise unusable
    InvalidAmount,
    /// Summary upsert failed
    ReconciliationWriteFailure,
    /// Some facts were skipped during aggregation
    AggregationPartialFailure,
    /// Payment not found
    PaymentNotFound,
    /// Summary not found
    SummaryNotFound,
    /// Payment id already taken
    DuplicateEntry,
    /// Recompute event could not be queued
    QueueUnavailable,
    /// Recompute task ended before producing a result
    RecomputeAborted,
    /// Amount arithmetic exceeded the decimal range
    ArithmeticOverflow,
    /// Storage read failure
    StorageError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::MalformedPeriodLabel => write!(f, "MALFORMED_PERIOD_LABEL"),
            ErrorCode::InvalidPeriod => write!(f, "INVALID_PERIOD"),
            ErrorCode::InvalidTaxRate => write!(f, "INVALID_TAX_RATE"),
            ErrorCode::InvalidAmount => write!(f, "INVALID_AMOUNT"),
            ErrorCode::ReconciliationWriteFailure => write!(f, "RECONCILIATION_WRITE_FAILURE"),
            ErrorCode::AggregationPartialFailure => write!(f, "AGGREGATION_PARTIAL_FAILURE"),
            ErrorCode::PaymentNotFound => write!(f, "PAYMENT_NOT_FOUND"),
            ErrorCode::SummaryNotFound => write!(f, "SUMMARY_NOT_FOUND"),
            ErrorCode::DuplicateEntry => write!(f, "DUPLICATE_ENTRY"),
            ErrorCode::QueueUnavailable => write!(f, "QUEUE_UNAVAILABLE"),
            ErrorCode::RecomputeAborted => write!(f, "RECOMPUTE_ABORTED"),
            ErrorCode::ArithmeticOverflow => write!(f, "ARITHMETIC_OVERFLOW"),
            ErrorCode::StorageError => write!(f, "STORAGE_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation completed with reduced output
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - summaries are going stale
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for rentledger-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Malformed period label '{label}': {reason}")]
    MalformedPeriodLabel {
        record_id: Option<String>,
        label: String,
        reason: String,
    },

    #[error("Invalid period: {message}")]
    InvalidPeriod { message: String },

    #[error("Invalid tax rate '{value}': {reason}")]
    InvalidTaxRate { value: String, reason: String },

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: String },

    #[error("Failed to write tax summary for {period}: {message}")]
    ReconciliationWriteFailure { period: String, message: String },

    #[error("Aggregation for {period} skipped {skipped} record(s)")]
    AggregationPartialFailure { period: String, skipped: usize },

    #[error("Payment not found: {id}")]
    PaymentNotFound { id: String },

    #[error("Tax summary not found: {id}")]
    SummaryNotFound { id: String },

    #[error("Duplicate entry: {entry}")]
    DuplicateEntry { entry: String },

    #[error("Recompute queue unavailable: {message}")]
    QueueUnavailable { message: String },

    #[error("Recompute aborted: {message}")]
    RecomputeAborted { message: String },

    #[error("Amount overflow computing {operation}")]
    ArithmeticOverflow { operation: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::MalformedPeriodLabel { .. } => ErrorCode::MalformedPeriodLabel,
            CoreError::InvalidPeriod { .. } => ErrorCode::InvalidPeriod,
            CoreError::InvalidTaxRate { .. } => ErrorCode::InvalidTaxRate,
            CoreError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            CoreError::ReconciliationWriteFailure { .. } => ErrorCode::ReconciliationWriteFailure,
            CoreError::AggregationPartialFailure { .. } => ErrorCode::AggregationPartialFailure,
            CoreError::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
            CoreError::SummaryNotFound { .. } => ErrorCode::SummaryNotFound,
            CoreError::DuplicateEntry { .. } => ErrorCode::DuplicateEntry,
            CoreError::QueueUnavailable { .. } => ErrorCode::QueueUnavailable,
            CoreError::RecomputeAborted { .. } => ErrorCode::RecomputeAborted,
            CoreError::ArithmeticOverflow { .. } => ErrorCode::ArithmeticOverflow,
            CoreError::Storage { .. } => ErrorCode::StorageError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::MalformedPeriodLabel { .. } => ErrorSeverity::Warning,
            CoreError::InvalidPeriod { .. } => ErrorSeverity::Info,
            CoreError::InvalidTaxRate { .. } => ErrorSeverity::Info,
            CoreError::InvalidAmount { .. } => ErrorSeverity::Info,
            CoreError::ReconciliationWriteFailure { .. } => ErrorSeverity::Critical,
            CoreError::AggregationPartialFailure { .. } => ErrorSeverity::Warning,
            CoreError::PaymentNotFound { .. } => ErrorSeverity::Info,
            CoreError::SummaryNotFound { .. } => ErrorSeverity::Info,
            CoreError::DuplicateEntry { .. } => ErrorSeverity::Warning,
            CoreError::QueueUnavailable { .. } => ErrorSeverity::Critical,
            CoreError::RecomputeAborted { .. } => ErrorSeverity::Critical,
            CoreError::ArithmeticOverflow { .. } => ErrorSeverity::Error,
            CoreError::Storage { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::MalformedPeriodLabel { record_id, label, .. } => {
                details = details.with_detail(serde_json::json!({
                    "record_id": record_id,
                    "label": label,
                }));
                details = details.with_suggestion(
                    "Correct the period to the form \"<Month> <YYYY>\", e.g. \"January 2025\".".to_string(),
                );
            }
            CoreError::InvalidTaxRate { .. } => {
                details = details.with_suggestion(
                    "Use a non-negative percentage, e.g. 25 for 25%.".to_string(),
                );
            }
            CoreError::InvalidPeriod { .. } => {
                details = details.with_suggestion(
                    "Use an English month name and a four-digit year.".to_string(),
                );
            }
            CoreError::ReconciliationWriteFailure { period, .. } => {
                details = details.with_detail(serde_json::json!({ "period": period }));
                details = details.with_suggestion(
                    "The stored summary is stale; run the calculation again for this period.".to_string(),
                );
            }
            CoreError::AggregationPartialFailure { .. } => {
                details = details.with_suggestion(
                    "Fix the skipped records' period labels and recalculate.".to_string(),
                );
            }
            CoreError::ArithmeticOverflow { .. } => {
                details = details.with_suggestion(
                    "Check the tax rate and amounts for implausibly large values.".to_string(),
                );
            }
            CoreError::PaymentNotFound { .. } | CoreError::SummaryNotFound { .. } => {
                details = details.with_suggestion("Check if the identifier is correct.".to_string());
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<PeriodError> for CoreError {
    fn from(error: PeriodError) -> Self {
        match error {
            PeriodError::MalformedLabel { label, reason } => CoreError::MalformedPeriodLabel {
                record_id: None,
                label,
                reason,
            },
            other => CoreError::InvalidPeriod {
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::PaymentNotFound { id } => CoreError::PaymentNotFound { id },
            StoreError::SummaryNotFound { id } => CoreError::SummaryNotFound { id },
            StoreError::DuplicateId { id } => CoreError::DuplicateEntry { entry: id },
            other => CoreError::Storage {
                message: other.to_string(),
            },
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Payment that triggered the operation, if any
    pub payment_id: Option<String>,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            payment_id: None,
            data: serde_json::json!({}),
        }
    }

    pub fn with_payment_id(mut self, payment_id: &str) -> Self {
        self.payment_id = Some(payment_id.to_string());
        self
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Operator-facing error reporting
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "rentledger::error",
            "ERROR [{}] {} - Operation: {} - Payment: {:?} - Data: {}",
            error.code(),
            error,
            context.operation,
            context.payment_id,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "rentledger::error",
            "WARNING: {} - Operation: {} - Payment: {:?}",
            message,
            context.operation,
            context.payment_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::MalformedPeriodLabel.to_string(), "MALFORMED_PERIOD_LABEL");
        assert_eq!(ErrorCode::InvalidTaxRate.to_string(), "INVALID_TAX_RATE");
        assert_eq!(
            ErrorCode::ReconciliationWriteFailure.to_string(),
            "RECONCILIATION_WRITE_FAILURE"
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::AggregationPartialFailure).unwrap();
        assert_eq!(json, "\"AGGREGATION_PARTIAL_FAILURE\"");
    }

    #[test]
    fn test_core_error_severity() {
        let error = CoreError::ReconciliationWriteFailure {
            period: "January 2025".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(error.severity(), ErrorSeverity::Critical);

        let error = CoreError::InvalidTaxRate {
            value: "-1".to_string(),
            reason: "negative".to_string(),
        };
        assert_eq!(error.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_period_error_conversion() {
        let error: CoreError = PeriodError::MalformedLabel {
            label: "2025".to_string(),
            reason: "expected a month and a year".to_string(),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::MalformedPeriodLabel);

        let error: CoreError = PeriodError::UnknownMonth {
            token: "Smarch".to_string(),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::InvalidPeriod);
    }

    #[test]
    fn test_store_error_conversion() {
        let error: CoreError = StoreError::PaymentNotFound { id: "p-1".to_string() }.into();
        assert_eq!(error, CoreError::PaymentNotFound { id: "p-1".to_string() });

        let error: CoreError = StoreError::Unavailable { message: "offline".to_string() }.into();
        assert_eq!(error.code(), ErrorCode::StorageError);
    }

    #[test]
    fn test_malformed_label_details() {
        let error = CoreError::MalformedPeriodLabel {
            record_id: Some("pay-10".to_string()),
            label: "2025".to_string(),
            reason: "expected a month and a year".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::MalformedPeriodLabel);
        assert_eq!(details.details.as_ref().unwrap()["record_id"], "pay-10");
        assert!(!details.suggestions.is_empty());
        assert!(details.to_string().starts_with("[MALFORMED_PERIOD_LABEL]"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("recompute")
            .with_payment_id("pay-1")
            .with_data("period", serde_json::json!("January 2025"));

        assert_eq!(context.operation, "recompute");
        assert_eq!(context.payment_id, Some("pay-1".to_string()));
        assert_eq!(context.data["period"], "January 2025");
    }
}
