//! Admin-facing operations
//!
//! [`TaxService`] is what the API talks to: manual calculations, summary
//! listing, and the payment/expense writes that feed the recompute channel.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rentledger_config::Config;
use rentledger_period::{parse_label, period_for, PeriodKey};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::aggregate::Aggregation;
use crate::coordinator::{FailureLog, RecomputeCoordinator, StaleSummaryReport};
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::events::{self, ChangePublisher, PaymentChange};
use crate::models::{ExpenseFact, NewExpense, NewPayment, PaymentFact, TaxSummary};
use crate::reconcile::{RateInput, Reconciler, TaxRate};
use crate::reports::AnnualReport;
use crate::store::Stores;
use crate::types::PaymentStatus;

/// Receiving side of the recompute channel, ready to run
pub struct RecomputeWorker {
    pub coordinator: Arc<RecomputeCoordinator>,
    rx: mpsc::Receiver<PaymentChange>,
}

impl RecomputeWorker {
    /// Run on a background task until the service is dropped
    pub fn spawn(self) -> JoinHandle<()> {
        self.coordinator.spawn(self.rx)
    }

    /// Handle every change queued so far on the current task; returns how many were handled
    pub async fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(change) = self.rx.try_recv() {
            let _ = self.coordinator.handle(&change).await;
            handled += 1;
        }
        handled
    }
}

/// Tax summary administration
pub struct TaxService {
    stores: Stores,
    reconciler: Reconciler,
    publisher: ChangePublisher,
    failures: Arc<FailureLog>,
    default_rate: TaxRate,
    currency: String,
    logger: DefaultErrorLogger,
}

impl TaxService {
    pub fn new(
        stores: Stores,
        reconciler: Reconciler,
        publisher: ChangePublisher,
        failures: Arc<FailureLog>,
        default_rate: TaxRate,
        currency: String,
    ) -> Self {
        Self {
            stores,
            reconciler,
            publisher,
            failures,
            default_rate,
            currency,
            logger: DefaultErrorLogger,
        }
    }

    /// Wire the service and, when enabled, its recompute worker from configuration
    pub fn build(config: &Config, stores: Stores) -> CoreResult<(Self, Option<RecomputeWorker>)> {
        let default_rate = TaxRate::from_percent(config.tax.default_rate_percent)?;
        let failures = Arc::new(FailureLog::new(config.recompute.failure_log_size));
        let reconciler = Reconciler::new(stores.summaries.clone(), config.currency.decimal_places);

        if !config.recompute.enabled {
            log::warn!(target: "rentledger::recompute", "Change-triggered recompute is disabled");
            let publisher = ChangePublisher::disabled(failures.clone());
            let service = Self::new(stores, reconciler, publisher, failures, default_rate, config.currency.code.clone());
            return Ok((service, None));
        }

        let (tx, rx) = events::channel(config.recompute.queue_capacity);
        let coordinator = Arc::new(RecomputeCoordinator::new(
            stores.clone(),
            reconciler.clone(),
            default_rate,
            failures.clone(),
        ));
        let publisher = ChangePublisher::new(tx, failures.clone());
        let service = Self::new(stores, reconciler, publisher, failures, default_rate, config.currency.code.clone());
        Ok((service, Some(RecomputeWorker { coordinator, rx })))
    }

    pub fn default_rate(&self) -> TaxRate {
        self.default_rate
    }

    /// Currency code amounts are reported in
    pub fn currency(&self) -> &str {
        &self.currency
    }

    fn rate_or_default(&self, rate: Option<RateInput>) -> CoreResult<TaxRate> {
        match rate {
            Some(rate) => rate.validate(),
            None => Ok(self.default_rate),
        }
    }

    // ==================== Summaries ====================

    /// Summaries of a year, latest month first
    pub async fn list_summaries(&self, year: i32) -> CoreResult<Vec<TaxSummary>> {
        let mut summaries = self.stores.summaries.list_summaries(year).await?;
        summaries.sort_by(|a, b| b.period.cmp(&a.period));
        Ok(summaries)
    }

    pub async fn get_summary(&self, id: &str) -> CoreResult<TaxSummary> {
        self.stores
            .summaries
            .get_summary(id)
            .await?
            .ok_or_else(|| CoreError::SummaryNotFound { id: id.to_string() })
    }

    /// Aggregation for a period, including records that had to be skipped
    pub async fn aggregation_for_period(&self, month: &str, year: i32) -> CoreResult<Aggregation> {
        let period = period_for(month, year)?;
        self.stores.aggregate(period).await
    }

    /// Manual "calculate monthly tax". The rate is validated before anything is read.
    pub async fn calculate_for_period(
        &self,
        month: &str,
        year: i32,
        rate: Option<RateInput>,
    ) -> CoreResult<TaxSummary> {
        let rate = self.rate_or_default(rate)?;
        let period = period_for(month, year)?;
        let aggregation = self.stores.aggregate(period).await?;
        self.report_skipped(&aggregation);
        self.reconciler.reconcile(period, &aggregation.facts, rate).await
    }

    /// Recalculate a stored summary by id; without a rate the summary keeps its own
    pub async fn recalculate_summary(&self, id: &str, rate: Option<RateInput>) -> CoreResult<TaxSummary> {
        let rate = rate.map(|rate| rate.validate()).transpose()?;
        let existing = self.get_summary(id).await?;
        let rate = match rate {
            Some(rate) => rate,
            None => TaxRate::new(existing.tax_rate)?,
        };

        let aggregation = self.stores.aggregate(existing.period).await?;
        self.report_skipped(&aggregation);
        self.reconciler
            .reconcile_existing(id, existing.period, &aggregation.facts, rate)
            .await
    }

    pub async fn annual_report(&self, year: i32) -> CoreResult<AnnualReport> {
        let summaries = self.list_summaries(year).await?;
        AnnualReport::from_summaries(year, &self.currency, &summaries)
    }

    /// Stale-summary reports from reactive recomputes, newest first
    pub fn stale_reports(&self) -> Vec<StaleSummaryReport> {
        self.failures.reports()
    }

    fn report_skipped(&self, aggregation: &Aggregation) {
        if let Some(partial) = aggregation.partial_failure() {
            let context = ErrorContext::new("calculate_for_period")
                .with_data("skipped", serde_json::json!(aggregation.skipped));
            self.logger.log_warning(&partial.to_string(), &context);
        }
    }

    // ==================== Payments ====================

    pub async fn list_payments(&self) -> CoreResult<Vec<PaymentFact>> {
        Ok(self.stores.payments.list_payments().await?)
    }

    pub async fn get_payment(&self, id: &str) -> CoreResult<PaymentFact> {
        self.stores
            .payments
            .get_payment(id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound { id: id.to_string() })
    }

    /// Schedule a rent obligation
    pub async fn record_payment(&self, new: NewPayment) -> CoreResult<PaymentFact> {
        ensure_non_negative("amount", new.amount)?;

        if let Err(e) = parse_label(&new.period_label) {
            // Accepted anyway: the label only blocks reporting, never billing
            self.logger.log_warning(
                &e.to_string(),
                &ErrorContext::new("record_payment").with_data("period_label", serde_json::json!(new.period_label)),
            );
        }

        let payment = PaymentFact {
            id: new.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            amount: new.amount,
            period_label: new.period_label,
            due_date: new.due_date,
            paid_date: paid_date_for(new.status, new.paid_date),
            status: new.status,
        };

        let payment = self.stores.payments.insert_payment(payment).await?;
        self.publisher.publish(PaymentChange::Inserted { after: payment.clone() });
        Ok(payment)
    }

    /// Change a payment's status. Marking paid without a date stamps today.
    pub async fn set_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> CoreResult<PaymentFact> {
        let (before, after) = self
            .stores
            .payments
            .update_payment_status(id, status, paid_date_for(status, paid_date))
            .await?;
        log::info!(
            target: "rentledger::payments",
            "Payment {} status {} -> {}",
            id,
            before.status,
            after.status
        );
        self.publisher.publish(PaymentChange::Updated {
            before,
            after: after.clone(),
        });
        Ok(after)
    }

    pub async fn delete_payment(&self, id: &str) -> CoreResult<PaymentFact> {
        let before = self.stores.payments.delete_payment(id).await?;
        self.publisher.publish(PaymentChange::Deleted { before: before.clone() });
        Ok(before)
    }

    // ==================== Expenses ====================

    pub async fn list_expenses(&self) -> CoreResult<Vec<ExpenseFact>> {
        Ok(self.stores.expenses.list_expenses().await?)
    }

    /// Log an expense. Summaries pick it up on their next calculation.
    pub async fn record_expense(&self, new: NewExpense) -> CoreResult<ExpenseFact> {
        ensure_non_negative("amount", new.amount)?;
        let expense = ExpenseFact {
            id: uuid::Uuid::new_v4().to_string(),
            category: new.category,
            amount: new.amount,
            expense_date: new.expense_date,
            description: new.description,
        };
        let expense = self.stores.expenses.insert_expense(expense).await?;
        log::info!(
            target: "rentledger::expenses",
            "Recorded {} expense {} for {}",
            expense.bucket(),
            expense.amount,
            PeriodKey::from_date(expense.expense_date)
        );
        Ok(expense)
    }
}

fn ensure_non_negative(field: &str, amount: Decimal) -> CoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(CoreError::InvalidAmount {
            field: field.to_string(),
            value: amount.to_string(),
        });
    }
    Ok(())
}

fn paid_date_for(status: PaymentStatus, paid_date: Option<NaiveDate>) -> Option<NaiveDate> {
    if status.is_paid() {
        paid_date.or_else(|| Some(Utc::now().date_naive()))
    } else {
        None
    }
}
