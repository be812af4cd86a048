//! Route modules for the API server
//!
//! - summaries: monthly tax summaries, manual calculation, annual totals
//! - payments: rent payment records (writes trigger recomputes)
//! - expenses: utility and maintenance expenses
//! - recompute: stale-summary reports from failed recomputes
//! - settings: effective configuration
//!
//! Each module keeps its handlers in api.rs and re-exports them from mod.rs.

pub mod expenses;
pub mod payments;
pub mod recompute;
pub mod settings;
pub mod summaries;
