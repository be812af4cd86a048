//! Storage boundary for payments, expenses and tax summaries
//!
//! The traits describe what the reconciliation logic needs from storage.
//! [`MemoryStore`] implements all three; it keys summaries by period so two
//! rows for the same month cannot exist, and upserts under a single write lock.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rentledger_period::PeriodKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::aggregate::{aggregate, Aggregation};
use crate::error::CoreResult;
use crate::models::{ExpenseFact, PaymentFact, SummaryDraft, TaxSummary};
use crate::types::PaymentStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Payment not found: {id}")]
    PaymentNotFound { id: String },

    #[error("Tax summary not found: {id}")]
    SummaryNotFound { id: String },

    #[error("Duplicate id: {id}")]
    DuplicateId { id: String },

    #[error("Summary {id} belongs to a different period")]
    PeriodMismatch { id: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid seed data: {message}")]
    InvalidSeed { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Payment storage. Writes are limited to status and paid date.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn list_payments(&self) -> StoreResult<Vec<PaymentFact>>;

    async fn get_payment(&self, id: &str) -> StoreResult<Option<PaymentFact>>;

    async fn insert_payment(&self, payment: PaymentFact) -> StoreResult<PaymentFact>;

    /// Update status and paid date; returns the record before and after the change
    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> StoreResult<(PaymentFact, PaymentFact)>;

    /// Delete a payment; returns the record as it was before deletion
    async fn delete_payment(&self, id: &str) -> StoreResult<PaymentFact>;
}

/// Expense storage
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn list_expenses(&self) -> StoreResult<Vec<ExpenseFact>>;

    async fn insert_expense(&self, expense: ExpenseFact) -> StoreResult<ExpenseFact>;
}

/// Tax summary storage, unique on (month, year)
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// All summaries of a year, latest month first
    async fn list_summaries(&self, year: i32) -> StoreResult<Vec<TaxSummary>>;

    async fn get_summary(&self, id: &str) -> StoreResult<Option<TaxSummary>>;

    async fn get_summary_for_period(&self, period: PeriodKey) -> StoreResult<Option<TaxSummary>>;

    /// Insert, or overwrite the existing row for the draft's period, atomically
    async fn upsert_summary(&self, draft: SummaryDraft) -> StoreResult<TaxSummary>;

    /// Overwrite a row by id; the draft must be for the row's period
    async fn update_summary(&self, id: &str, draft: SummaryDraft) -> StoreResult<TaxSummary>;
}

/// Handles to the three stores, shared by the service and the coordinator
#[derive(Clone)]
pub struct Stores {
    pub payments: Arc<dyn PaymentStore>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub summaries: Arc<dyn SummaryStore>,
}

impl Stores {
    /// Use one memory store for everything
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            payments: store.clone(),
            expenses: store.clone(),
            summaries: store,
        }
    }

    /// Load the current facts and aggregate them for `period`
    pub async fn aggregate(&self, period: PeriodKey) -> CoreResult<Aggregation> {
        let payments = self.payments.list_payments().await?;
        let expenses = self.expenses.list_expenses().await?;
        aggregate(period, &payments, &expenses)
    }
}

/// Seed file contents
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub payments: Vec<PaymentFact>,
    #[serde(default)]
    pub expenses: Vec<ExpenseFact>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    payments: RwLock<Vec<PaymentFact>>,
    expenses: RwLock<Vec<ExpenseFact>>,
    summaries: RwLock<BTreeMap<PeriodKey, TaxSummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with seed data.
    ///
    /// Seed records get the same checks as writes through the service: unique
    /// ids and non-negative amounts.
    pub fn from_seed(seed: SeedData) -> StoreResult<Self> {
        let mut ids = HashSet::new();
        for payment in &seed.payments {
            if !ids.insert(payment.id.as_str()) {
                return Err(StoreError::DuplicateId { id: payment.id.clone() });
            }
            check_seed_amount("payment", &payment.id, payment.amount)?;
        }

        let mut ids = HashSet::new();
        for expense in &seed.expenses {
            if !ids.insert(expense.id.as_str()) {
                return Err(StoreError::DuplicateId { id: expense.id.clone() });
            }
            check_seed_amount("expense", &expense.id, expense.amount)?;
        }

        Ok(Self {
            payments: RwLock::new(seed.payments),
            expenses: RwLock::new(seed.expenses),
            summaries: RwLock::new(BTreeMap::new()),
        })
    }

    /// Load seed data from a JSON file
    pub async fn load_seed(path: &Path) -> StoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| StoreError::Unavailable {
            message: format!("{}: {}", path.display(), e),
        })?;
        let seed: SeedData = serde_json::from_str(&content).map_err(|e| StoreError::InvalidSeed {
            message: e.to_string(),
        })?;
        log::info!(
            target: "rentledger::store",
            "Loaded seed {}: {} payments, {} expenses",
            path.display(),
            seed.payments.len(),
            seed.expenses.len()
        );
        Self::from_seed(seed)
    }
}

fn check_seed_amount(kind: &str, id: &str, amount: Decimal) -> StoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(StoreError::InvalidSeed {
            message: format!("{} {} has negative amount {}", kind, id, amount),
        });
    }
    Ok(())
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn list_payments(&self) -> StoreResult<Vec<PaymentFact>> {
        Ok(self.payments.read().await.clone())
    }

    async fn get_payment(&self, id: &str) -> StoreResult<Option<PaymentFact>> {
        Ok(self.payments.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_payment(&self, payment: PaymentFact) -> StoreResult<PaymentFact> {
        let mut payments = self.payments.write().await;
        if payments.iter().any(|p| p.id == payment.id) {
            return Err(StoreError::DuplicateId { id: payment.id });
        }
        payments.push(payment.clone());
        Ok(payment)
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> StoreResult<(PaymentFact, PaymentFact)> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PaymentNotFound { id: id.to_string() })?;
        let before = payment.clone();
        payment.status = status;
        payment.paid_date = paid_date;
        Ok((before, payment.clone()))
    }

    async fn delete_payment(&self, id: &str) -> StoreResult<PaymentFact> {
        let mut payments = self.payments.write().await;
        let index = payments
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::PaymentNotFound { id: id.to_string() })?;
        Ok(payments.remove(index))
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn list_expenses(&self) -> StoreResult<Vec<ExpenseFact>> {
        Ok(self.expenses.read().await.clone())
    }

    async fn insert_expense(&self, expense: ExpenseFact) -> StoreResult<ExpenseFact> {
        let mut expenses = self.expenses.write().await;
        if expenses.iter().any(|e| e.id == expense.id) {
            return Err(StoreError::DuplicateId { id: expense.id });
        }
        expenses.push(expense.clone());
        Ok(expense)
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn list_summaries(&self, year: i32) -> StoreResult<Vec<TaxSummary>> {
        let summaries = self.summaries.read().await;
        Ok(summaries
            .values()
            .rev()
            .filter(|s| s.period.year == year)
            .cloned()
            .collect())
    }

    async fn get_summary(&self, id: &str) -> StoreResult<Option<TaxSummary>> {
        Ok(self.summaries.read().await.values().find(|s| s.id == id).cloned())
    }

    async fn get_summary_for_period(&self, period: PeriodKey) -> StoreResult<Option<TaxSummary>> {
        Ok(self.summaries.read().await.get(&period).cloned())
    }

    async fn upsert_summary(&self, draft: SummaryDraft) -> StoreResult<TaxSummary> {
        let mut summaries = self.summaries.write().await;
        let id = summaries
            .get(&draft.period)
            .map(|existing| existing.id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let summary = TaxSummary::from_draft(id, draft, Utc::now());
        summaries.insert(summary.period, summary.clone());
        Ok(summary)
    }

    async fn update_summary(&self, id: &str, draft: SummaryDraft) -> StoreResult<TaxSummary> {
        let mut summaries = self.summaries.write().await;
        let existing = summaries
            .values()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::SummaryNotFound { id: id.to_string() })?;
        if existing.period != draft.period {
            return Err(StoreError::PeriodMismatch { id: id.to_string() });
        }
        let summary = TaxSummary::from_draft(id.to_string(), draft, Utc::now());
        summaries.insert(summary.period, summary.clone());
        Ok(summary)
    }
}
