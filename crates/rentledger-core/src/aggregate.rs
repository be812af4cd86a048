//! Financial fact aggregation for a single period
//!
//! Pure over already-loaded fact lists: no I/O, no cached state. A payment
//! whose label cannot be resolved is skipped and reported; the rest of the
//! batch still aggregates. Sums are checked and overflow is an error.

use rentledger_period::{PeriodError, PeriodKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::models::{ExpenseFact, PaymentFact};
use crate::types::ExpenseBucket;

/// Categorized totals for one period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialFacts {
    pub total_revenue: Decimal,
    pub electricity: Decimal,
    pub water: Decimal,
    pub gas: Decimal,
    pub maintenance: Decimal,
    pub other_expenses: Decimal,
    /// Paid payments counted into revenue
    pub payment_count: usize,
    /// Expenses counted into the buckets
    pub expense_count: usize,
}

impl FinancialFacts {
    /// Sum of every expense bucket; `None` on overflow
    pub fn total_utilities(&self) -> Option<Decimal> {
        self.electricity
            .checked_add(self.water)?
            .checked_add(self.gas)?
            .checked_add(self.maintenance)?
            .checked_add(self.other_expenses)
    }

    fn add_revenue(&mut self, amount: Decimal) -> Option<()> {
        self.total_revenue = self.total_revenue.checked_add(amount)?;
        self.payment_count += 1;
        Some(())
    }

    fn add_expense(&mut self, bucket: ExpenseBucket, amount: Decimal) -> Option<()> {
        let slot = match bucket {
            ExpenseBucket::Electricity => &mut self.electricity,
            ExpenseBucket::Water => &mut self.water,
            ExpenseBucket::Gas => &mut self.gas,
            ExpenseBucket::Maintenance => &mut self.maintenance,
            ExpenseBucket::Other => &mut self.other_expenses,
        };
        *slot = slot.checked_add(amount)?;
        self.expense_count += 1;
        Some(())
    }
}

/// A payment left out of the totals because its period label could not be resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub record_id: String,
    pub label: String,
    pub reason: String,
}

impl SkippedRecord {
    fn payment(payment: &PaymentFact, error: PeriodError) -> Self {
        let reason = match error {
            PeriodError::MalformedLabel { reason, .. } => reason,
            other => other.to_string(),
        };
        Self {
            record_id: payment.id.clone(),
            label: payment.period_label.clone(),
            reason,
        }
    }

    /// Per-record error for operator reports
    pub fn to_error(&self) -> CoreError {
        CoreError::MalformedPeriodLabel {
            record_id: Some(self.record_id.clone()),
            label: self.label.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Aggregation result: totals plus whatever had to be skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub period: PeriodKey,
    pub facts: FinancialFacts,
    pub skipped: Vec<SkippedRecord>,
}

impl Aggregation {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Batch-level error describing the skipped records, if any
    pub fn partial_failure(&self) -> Option<CoreError> {
        if self.is_partial() {
            Some(CoreError::AggregationPartialFailure {
                period: self.period.to_string(),
                skipped: self.skipped.len(),
            })
        } else {
            None
        }
    }
}

/// Aggregate payments and expenses into the totals for `period`.
///
/// Only paid payments count toward revenue. Malformed labels on payments that
/// are not paid are ignored, since they contribute nothing either way.
pub fn aggregate(period: PeriodKey, payments: &[PaymentFact], expenses: &[ExpenseFact]) -> CoreResult<Aggregation> {
    let mut facts = FinancialFacts::default();
    let mut skipped = Vec::new();

    for payment in payments.iter().filter(|p| p.is_paid()) {
        match payment.period() {
            Ok(key) if key == period => {
                facts
                    .add_revenue(payment.amount)
                    .ok_or_else(|| overflow("revenue", period))?;
            }
            Ok(_) => {}
            Err(e) => skipped.push(SkippedRecord::payment(payment, e)),
        }
    }

    for expense in expenses.iter().filter(|e| e.period() == period) {
        facts
            .add_expense(expense.bucket(), expense.amount)
            .ok_or_else(|| overflow("expenses", period))?;
    }

    Ok(Aggregation {
        period,
        facts,
        skipped,
    })
}

fn overflow(what: &str, period: PeriodKey) -> CoreError {
    CoreError::ArithmeticOverflow {
        operation: format!("{} for {}", what, period),
    }
}
