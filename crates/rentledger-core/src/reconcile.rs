//! Tax summary reconciliation
//!
//! Turns aggregated facts into the derived summary columns and persists them
//! with a single atomic upsert per call.

use std::sync::Arc;

use rentledger_period::PeriodKey;
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::FinancialFacts;
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::{SummaryDraft, TaxFigures, TaxSummary};
use crate::store::SummaryStore;

/// Tax rate as a percentage (25 means 25%). Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    pub fn new(percent: Decimal) -> CoreResult<Self> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(CoreError::InvalidTaxRate {
                value: percent.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(Self(percent))
    }

    /// Validate a caller-supplied floating point percentage
    pub fn from_percent(percent: f64) -> CoreResult<Self> {
        if !percent.is_finite() {
            return Err(CoreError::InvalidTaxRate {
                value: percent.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        let value = Decimal::try_from(percent).map_err(|e| CoreError::InvalidTaxRate {
            value: percent.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(value)
    }

    /// Validate a percentage given as text
    pub fn parse(text: &str) -> CoreResult<Self> {
        let value: Decimal = text.trim().parse().map_err(|_| CoreError::InvalidTaxRate {
            value: text.to_string(),
            reason: "not a number".to_string(),
        })?;
        Self::new(value)
    }

    pub fn percent(&self) -> Decimal {
        self.0
    }
}

/// A rate as a caller supplied it, before validation
#[derive(Debug, Clone, PartialEq)]
pub enum RateInput {
    Percent(f64),
    Text(String),
}

impl RateInput {
    pub fn validate(&self) -> CoreResult<TaxRate> {
        match self {
            RateInput::Percent(percent) => TaxRate::from_percent(*percent),
            RateInput::Text(text) => TaxRate::parse(text),
        }
    }
}

impl From<f64> for RateInput {
    fn from(percent: f64) -> Self {
        RateInput::Percent(percent)
    }
}

impl From<&str> for RateInput {
    fn from(text: &str) -> Self {
        RateInput::Text(text.to_string())
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self(Decimal::from(25))
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Derive the summary columns from aggregated facts.
///
/// `total_utilities` and `net_income` are exact; only `tax_amount` is rounded,
/// to `decimal_places`, midpoint away from zero. A negative net income gives
/// a negative tax amount. Results outside the decimal range are
/// [`CoreError::ArithmeticOverflow`].
pub fn compute_figures(facts: &FinancialFacts, rate: TaxRate, decimal_places: u32) -> CoreResult<TaxFigures> {
    let total_utilities = facts.total_utilities().ok_or_else(|| overflow("total utilities"))?;
    let net_income = facts
        .total_revenue
        .checked_sub(total_utilities)
        .ok_or_else(|| overflow("net income"))?;
    let tax_amount = net_income
        .checked_mul(rate.percent())
        .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| overflow("tax amount"))?
        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);

    Ok(TaxFigures {
        total_revenue: facts.total_revenue,
        total_utilities,
        electricity: facts.electricity,
        water: facts.water,
        gas: facts.gas,
        maintenance: facts.maintenance,
        other_expenses: facts.other_expenses,
        net_income,
        tax_amount,
    })
}

fn overflow(operation: &str) -> CoreError {
    CoreError::ArithmeticOverflow {
        operation: operation.to_string(),
    }
}

/// Writes summaries for periods
#[derive(Clone)]
pub struct Reconciler {
    summaries: Arc<dyn SummaryStore>,
    decimal_places: u32,
    logger: DefaultErrorLogger,
}

impl Reconciler {
    pub fn new(summaries: Arc<dyn SummaryStore>, decimal_places: u32) -> Self {
        Self {
            summaries,
            decimal_places,
            logger: DefaultErrorLogger,
        }
    }

    /// Build the row that reconciliation would write
    pub fn draft(&self, period: PeriodKey, facts: &FinancialFacts, rate: TaxRate) -> CoreResult<SummaryDraft> {
        let figures = compute_figures(facts, rate, self.decimal_places).map_err(|error| {
            self.logger.log_error(
                &error,
                &ErrorContext::new("reconcile")
                    .with_data("period", serde_json::json!(period.label()))
                    .with_data("tax_rate", serde_json::json!(rate.to_string())),
            );
            error
        })?;
        Ok(SummaryDraft {
            period,
            tax_rate: rate.percent(),
            figures,
        })
    }

    /// Compute and upsert the summary for `period`
    pub async fn reconcile(
        &self,
        period: PeriodKey,
        facts: &FinancialFacts,
        rate: TaxRate,
    ) -> CoreResult<TaxSummary> {
        let draft = self.draft(period, facts, rate)?;
        let summary = self
            .summaries
            .upsert_summary(draft)
            .await
            .map_err(|e| self.write_failure(period, e.to_string()))?;

        log::info!(
            target: "rentledger::reconcile",
            "Reconciled {}: revenue={} utilities={} net={} tax={} ({})",
            period,
            summary.figures.total_revenue,
            summary.figures.total_utilities,
            summary.figures.net_income,
            summary.figures.tax_amount,
            rate
        );
        Ok(summary)
    }

    /// Overwrite an existing summary by id with freshly computed figures
    pub async fn reconcile_existing(
        &self,
        id: &str,
        period: PeriodKey,
        facts: &FinancialFacts,
        rate: TaxRate,
    ) -> CoreResult<TaxSummary> {
        let draft = self.draft(period, facts, rate)?;
        self.summaries
            .update_summary(id, draft)
            .await
            .map_err(|e| self.write_failure(period, e.to_string()))
    }

    fn write_failure(&self, period: PeriodKey, message: String) -> CoreError {
        let error = CoreError::ReconciliationWriteFailure {
            period: period.to_string(),
            message,
        };
        self.logger.log_error(
            &error,
            &ErrorContext::new("reconcile").with_data("period", serde_json::json!(period.label())),
        );
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use rentledger_period::Month;
    use rust_decimal_macros::dec;

    fn facts() -> FinancialFacts {
        FinancialFacts {
            total_revenue: dec!(3600.00),
            electricity: dec!(120.40),
            water: dec!(35.10),
            gas: dec!(0),
            maintenance: dec!(410.00),
            other_expenses: dec!(15.99),
            payment_count: 3,
            expense_count: 4,
        }
    }

    fn january() -> PeriodKey {
        PeriodKey::new(Month::January, 2025)
    }

    struct FailingStore;

    #[async_trait]
    impl SummaryStore for FailingStore {
        async fn list_summaries(&self, _year: i32) -> StoreResult<Vec<TaxSummary>> {
            Ok(vec![])
        }
        async fn get_summary(&self, _id: &str) -> StoreResult<Option<TaxSummary>> {
            Ok(None)
        }
        async fn get_summary_for_period(&self, _period: PeriodKey) -> StoreResult<Option<TaxSummary>> {
            Ok(None)
        }
        async fn upsert_summary(&self, _draft: SummaryDraft) -> StoreResult<TaxSummary> {
            Err(StoreError::Unavailable { message: "connection reset".to_string() })
        }
        async fn update_summary(&self, _id: &str, _draft: SummaryDraft) -> StoreResult<TaxSummary> {
            Err(StoreError::Unavailable { message: "connection reset".to_string() })
        }
    }

    #[test]
    fn test_tax_rate_validation() {
        assert_eq!(TaxRate::from_percent(25.0).unwrap().percent(), dec!(25));
        assert_eq!(TaxRate::from_percent(0.0).unwrap().percent(), dec!(0));
        assert!(matches!(TaxRate::from_percent(-0.5), Err(CoreError::InvalidTaxRate { .. })));
        assert!(matches!(TaxRate::from_percent(f64::NAN), Err(CoreError::InvalidTaxRate { .. })));
        assert!(matches!(TaxRate::from_percent(f64::INFINITY), Err(CoreError::InvalidTaxRate { .. })));
        assert!(matches!(TaxRate::parse("abc"), Err(CoreError::InvalidTaxRate { .. })));
        assert_eq!(TaxRate::parse(" 12.5 ").unwrap().percent(), dec!(12.5));
        assert_eq!(TaxRate::default().percent(), dec!(25));
    }

    #[test]
    fn test_rate_input_validation() {
        assert_eq!(RateInput::from(12.5).validate().unwrap().percent(), dec!(12.5));
        assert_eq!(RateInput::from("30").validate().unwrap().percent(), dec!(30));
        assert!(matches!(RateInput::from("abc").validate(), Err(CoreError::InvalidTaxRate { .. })));
        assert!(matches!(RateInput::from("-2").validate(), Err(CoreError::InvalidTaxRate { .. })));
    }

    #[test]
    fn test_huge_rate_overflows_into_error() {
        let facts = FinancialFacts {
            total_revenue: dec!(1000000000),
            ..Default::default()
        };
        let rate = TaxRate::from_percent(1e20).unwrap();
        let err = compute_figures(&facts, rate, 2).unwrap_err();
        assert_eq!(
            err,
            CoreError::ArithmeticOverflow {
                operation: "tax amount".to_string()
            }
        );

        // Same rate is fine when there is nothing to tax
        let figures = compute_figures(&FinancialFacts::default(), rate, 2).unwrap();
        assert_eq!(figures.tax_amount, dec!(0));
    }

    #[test]
    fn test_net_income_overflow() {
        let facts = FinancialFacts {
            total_revenue: Decimal::MIN,
            maintenance: Decimal::MAX,
            ..Default::default()
        };
        assert!(matches!(
            compute_figures(&facts, TaxRate::default(), 2),
            Err(CoreError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_figures_invariants() {
        let rate = TaxRate::new(dec!(25)).unwrap();
        let figures = compute_figures(&facts(), rate, 2).unwrap();

        assert_eq!(
            figures.total_utilities,
            figures.electricity + figures.water + figures.gas + figures.maintenance + figures.other_expenses
        );
        assert_eq!(figures.total_utilities, dec!(581.49));
        assert_eq!(figures.net_income, figures.total_revenue - figures.total_utilities);
        assert_eq!(figures.net_income, dec!(3018.51));
        // 3018.51 * 0.25 = 754.6275
        assert_eq!(figures.tax_amount, dec!(754.63));
    }

    #[test]
    fn test_negative_net_income_not_clamped() {
        let facts = FinancialFacts {
            total_revenue: dec!(100),
            maintenance: dec!(500),
            ..Default::default()
        };
        let figures = compute_figures(&facts, TaxRate::default(), 2).unwrap();
        assert_eq!(figures.net_income, dec!(-400));
        assert_eq!(figures.tax_amount, dec!(-100));
    }

    #[test]
    fn test_zero_facts_give_zero_figures() {
        let figures = compute_figures(&FinancialFacts::default(), TaxRate::default(), 2).unwrap();
        assert_eq!(figures, TaxFigures::default());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(store.clone(), 2);
        let rate = TaxRate::default();

        let first = reconciler.reconcile(january(), &facts(), rate).await.unwrap();
        let second = reconciler.reconcile(january(), &facts(), rate).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.figures, second.figures);
        assert_eq!(first.tax_rate, second.tax_rate);
        assert_eq!(store.list_summaries(2025).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_overwrites_previous_values() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(store.clone(), 2);

        reconciler.reconcile(january(), &facts(), TaxRate::default()).await.unwrap();
        let updated = reconciler
            .reconcile(january(), &FinancialFacts::default(), TaxRate::new(dec!(10)).unwrap())
            .await
            .unwrap();

        let stored = store.get_summary_for_period(january()).await.unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.figures.total_revenue, dec!(0));
        assert_eq!(stored.tax_rate, dec!(10));
    }

    #[tokio::test]
    async fn test_overflow_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(store.clone(), 2);
        let facts = FinancialFacts {
            total_revenue: dec!(1000000000),
            ..Default::default()
        };
        let err = reconciler
            .reconcile(january(), &facts, TaxRate::from_percent(1e20).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ArithmeticOverflow);
        assert!(store.get_summary_for_period(january()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let reconciler = Reconciler::new(Arc::new(FailingStore), 2);
        let err = reconciler
            .reconcile(january(), &facts(), TaxRate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ReconciliationWriteFailure { ref period, .. } if period == "January 2025"
        ));
    }
}
