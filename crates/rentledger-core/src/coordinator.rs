//! Change-triggered recompute
//!
//! Consumes [`PaymentChange`] events and re-aggregates the affected period from
//! the current stored facts. Each recompute is a full pass, never a delta, so
//! a later recompute always repairs an earlier stale one. Failures are recorded
//! for operators and dropped; the next change for that period retries naturally.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rentledger_period::{parse_label, PeriodKey};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger};
use crate::events::PaymentChange;
use crate::models::TaxSummary;
use crate::reconcile::{Reconciler, TaxRate};
use crate::store::Stores;

/// A summary that could not be brought up to date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleSummaryReport {
    pub payment_id: String,
    pub period_label: String,
    pub period: Option<PeriodKey>,
    pub code: ErrorCode,
    pub message: String,
    pub reported_at: DateTime<Utc>,
}

/// Bounded log of recompute failures, newest kept
#[derive(Debug)]
pub struct FailureLog {
    capacity: usize,
    entries: Mutex<VecDeque<StaleSummaryReport>>,
    logger: DefaultErrorLogger,
}

impl FailureLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
            logger: DefaultErrorLogger,
        }
    }

    /// Log the failure and keep it for the operator report
    pub fn record(&self, payment_id: &str, period_label: &str, period: Option<PeriodKey>, error: &CoreError) {
        self.logger.log_error(
            error,
            &ErrorContext::new("recompute")
                .with_payment_id(payment_id)
                .with_data("period_label", serde_json::json!(period_label)),
        );

        let report = StaleSummaryReport {
            payment_id: payment_id.to_string(),
            period_label: period_label.to_string(),
            period,
            code: error.code(),
            message: error.to_string(),
            reported_at: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(report);
    }

    /// Reports, newest first
    pub fn reports(&self) -> Vec<StaleSummaryReport> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recomputes summaries in response to payment changes
pub struct RecomputeCoordinator {
    stores: Stores,
    reconciler: Reconciler,
    default_rate: TaxRate,
    failures: Arc<FailureLog>,
    logger: DefaultErrorLogger,
}

impl RecomputeCoordinator {
    pub fn new(stores: Stores, reconciler: Reconciler, default_rate: TaxRate, failures: Arc<FailureLog>) -> Self {
        Self {
            stores,
            reconciler,
            default_rate,
            failures,
            logger: DefaultErrorLogger,
        }
    }

    /// Handle one change. `None` when the change does not affect any summary.
    pub async fn handle(&self, change: &PaymentChange) -> Option<CoreResult<TaxSummary>> {
        let label = change.recompute_label()?;
        let payment_id = change.payment_id();
        log::debug!(
            target: "rentledger::recompute",
            "Payment {} changed; recomputing '{}'",
            payment_id,
            label
        );

        let period = match parse_label(label) {
            Ok(period) => period,
            Err(e) => {
                let error = match CoreError::from(e) {
                    CoreError::MalformedPeriodLabel { label, reason, .. } => CoreError::MalformedPeriodLabel {
                        record_id: Some(payment_id.to_string()),
                        label,
                        reason,
                    },
                    other => other,
                };
                self.failures.record(payment_id, label, None, &error);
                return Some(Err(error));
            }
        };

        let result = self.recompute(period).await;
        if let Err(ref error) = result {
            self.failures.record(payment_id, label, Some(period), error);
        }
        Some(result)
    }

    /// Full re-aggregation of `period` from current facts.
    ///
    /// Keeps the rate of an existing summary; new summaries get the default rate.
    pub async fn recompute(&self, period: PeriodKey) -> CoreResult<TaxSummary> {
        let aggregation = self.stores.aggregate(period).await?;
        if let Some(partial) = aggregation.partial_failure() {
            let context = ErrorContext::new("recompute").with_data("period", serde_json::json!(period.label()));
            self.logger.log_warning(&partial.to_string(), &context);
            for skipped in &aggregation.skipped {
                self.logger.log_error(&skipped.to_error(), &context);
            }
        }

        let rate = self.rate_for(period).await?;
        self.reconciler.reconcile(period, &aggregation.facts, rate).await
    }

    async fn rate_for(&self, period: PeriodKey) -> CoreResult<TaxRate> {
        match self.stores.summaries.get_summary_for_period(period).await? {
            Some(existing) => TaxRate::new(existing.tax_rate),
            None => Ok(self.default_rate),
        }
    }

    /// Drain the change channel until every publisher is dropped.
    ///
    /// Each change is handled on its own task; one that panics is recorded as
    /// aborted and the loop moves on to the next change.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<PaymentChange>) {
        log::info!(target: "rentledger::recompute", "Recompute coordinator started");
        while let Some(change) = rx.recv().await {
            let payment_id = change.payment_id().to_string();
            let label = change.recompute_label().unwrap_or_default().to_string();
            let coordinator = self.clone();
            let task = tokio::spawn(async move {
                let _ = coordinator.handle(&change).await;
            });
            if let Err(e) = task.await {
                let error = CoreError::RecomputeAborted { message: e.to_string() };
                self.failures.record(&payment_id, &label, None, &error);
            }
        }
        log::info!(target: "rentledger::recompute", "Recompute coordinator stopped");
    }

    pub fn spawn(self: Arc<Self>, rx: mpsc::Receiver<PaymentChange>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }
}
