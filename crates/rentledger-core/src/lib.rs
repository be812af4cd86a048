//! Core rental ledger processing
//!
//! Payments and expenses are the stored facts. Monthly tax summaries are
//! derived from them:
//! - aggregate: per-period totals from payment and expense facts
//! - reconcile: tax figures from totals, and the summary upsert
//! - events / coordinator: recompute a period when a payment changes
//! - service: the admin operations the API exposes

pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod models;
pub mod reconcile;
pub mod reports;
pub mod service;
pub mod store;
pub mod types;

pub use aggregate::{aggregate, Aggregation, FinancialFacts, SkippedRecord};
pub use coordinator::{FailureLog, RecomputeCoordinator, StaleSummaryReport};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use events::{ChangePublisher, PaymentChange};
pub use models::{ExpenseFact, NewExpense, NewPayment, PaymentFact, SummaryDraft, TaxFigures, TaxSummary};
pub use reconcile::{compute_figures, RateInput, Reconciler, TaxRate};
pub use reports::{AnnualReport, SummariesResponse};
pub use service::{RecomputeWorker, TaxService};
pub use store::{ExpenseStore, MemoryStore, PaymentStore, SeedData, StoreError, Stores, SummaryStore};
pub use types::{ExpenseBucket, PaymentStatus};

pub use rentledger_period::{Month, PeriodKey};
