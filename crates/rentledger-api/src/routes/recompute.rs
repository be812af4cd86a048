//! Recompute failure reports

use axum::Json;
use rentledger_core::StaleSummaryReport;

use crate::AppState;

/// Summaries that a payment change could not bring up to date, newest first
pub async fn api_recompute_failures(state: axum::extract::State<AppState>) -> Json<Vec<StaleSummaryReport>> {
    Json(state.service.stale_reports())
}
