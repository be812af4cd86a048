//! Core data models: payment and expense facts, stored tax summaries

use chrono::{DateTime, NaiveDate, Utc};
use rentledger_period::{resolve, PeriodError, PeriodKey, PeriodSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ExpenseBucket, PaymentStatus};

/// A scheduled rent obligation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFact {
    /// Unique payment identifier
    pub id: String,
    /// Amount due (non-negative)
    pub amount: Decimal,
    /// Free-text billing period, e.g. "January 2025"
    pub period_label: String,
    /// Date the rent is due
    pub due_date: NaiveDate,
    /// Date the payment was received
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    /// Current status
    #[serde(default)]
    pub status: PaymentStatus,
}

impl PaymentFact {
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// Resolve the billing period from the free-text label
    pub fn period(&self) -> Result<PeriodKey, PeriodError> {
        resolve(PeriodSource::Label(&self.period_label))
    }
}

/// A logged expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFact {
    pub id: String,
    /// Free-form category ("utilities", "maintenance", ...)
    pub category: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExpenseFact {
    pub fn bucket(&self) -> ExpenseBucket {
        ExpenseBucket::from_category(&self.category)
    }

    pub fn period(&self) -> PeriodKey {
        PeriodKey::from_date(self.expense_date)
    }
}

/// Payment as submitted by the billing screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    /// Caller-chosen id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub amount: Decimal,
    pub period_label: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// Expense as submitted by the expenses screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub category: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

/// Derived monetary columns of a tax summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxFigures {
    pub total_revenue: Decimal,
    pub total_utilities: Decimal,
    pub electricity: Decimal,
    pub water: Decimal,
    pub gas: Decimal,
    pub maintenance: Decimal,
    pub other_expenses: Decimal,
    pub net_income: Decimal,
    pub tax_amount: Decimal,
}

/// Summary row about to be written; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDraft {
    pub period: PeriodKey,
    /// Percentage, 25 means 25%
    pub tax_rate: Decimal,
    #[serde(flatten)]
    pub figures: TaxFigures,
}

/// Persisted monthly tax summary. At most one exists per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub id: String,
    pub period: PeriodKey,
    pub tax_rate: Decimal,
    #[serde(flatten)]
    pub figures: TaxFigures,
    pub updated_at: DateTime<Utc>,
}

impl TaxSummary {
    pub fn from_draft(id: String, draft: SummaryDraft, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            period: draft.period,
            tax_rate: draft.tax_rate,
            figures: draft.figures,
            updated_at,
        }
    }
}
