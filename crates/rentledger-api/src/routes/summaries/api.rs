//! Tax summary API endpoints - JSON API
//!
//! Endpoints:
//! - api_summaries: Summaries of a year, latest month first
//! - api_calculate: Calculate (or recalculate) one month
//! - api_update_summary: Recalculate a stored summary with a new rate
//! - api_annual_report: Totals across a year
//! - api_preview: Aggregation for one month without storing anything

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::Json;
use chrono::{Datelike, Utc};
use rentledger_core::{Aggregation, AnnualReport, CoreError, RateInput, SummariesResponse, TaxSummary};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub month: String,
    pub year: i32,
    #[serde(default)]
    pub tax_rate: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSummaryRequest {
    #[serde(default)]
    pub tax_rate: Option<Value>,
}

/// Accept the rate as a JSON number or a numeric string; validation happens in core
fn rate_input(value: Option<Value>) -> ApiResult<Option<RateInput>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(RateInput::Text(text))),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(percent) => Ok(Some(RateInput::Percent(percent))),
            None => Err(invalid_rate(number.to_string())),
        },
        Some(other) => Err(invalid_rate(other.to_string())),
    }
}

fn invalid_rate(value: String) -> ApiError {
    ApiError::Core(CoreError::InvalidTaxRate {
        value,
        reason: "not a number".to_string(),
    })
}

fn year_param(params: &HashMap<String, String>) -> ApiResult<i32> {
    match params.get("year") {
        Some(year) => year
            .trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("invalid year '{}'", year))),
        None => Ok(Utc::now().year()),
    }
}

/// List summaries for `?year=` (current year when omitted)
pub async fn api_summaries(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> ApiResult<Json<SummariesResponse>> {
    let year = year_param(&params)?;
    let summaries = state.service.list_summaries(year).await?;
    Ok(Json(SummariesResponse {
        year,
        currency: state.service.currency().to_string(),
        total_count: summaries.len(),
        summaries,
    }))
}

/// Manual "calculate monthly tax"
pub async fn api_calculate(
    state: axum::extract::State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<Json<TaxSummary>> {
    let rate = rate_input(request.tax_rate)?;
    let summary = state
        .service
        .calculate_for_period(&request.month, request.year, rate)
        .await?;
    Ok(Json(summary))
}

pub async fn api_update_summary(
    state: axum::extract::State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSummaryRequest>,
) -> ApiResult<Json<TaxSummary>> {
    let rate = rate_input(request.tax_rate)?;
    let summary = state.service.recalculate_summary(&id, rate).await?;
    Ok(Json(summary))
}

pub async fn api_annual_report(
    state: axum::extract::State<AppState>,
    Path(year): Path<i32>,
) -> ApiResult<Json<AnnualReport>> {
    Ok(Json(state.service.annual_report(year).await?))
}

/// Preview `?month=&year=`, listing any records skipped for bad labels
pub async fn api_preview(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> ApiResult<Json<Aggregation>> {
    let month = params
        .get("month")
        .ok_or_else(|| ApiError::bad_request("missing month"))?;
    let year = year_param(&params)?;
    Ok(Json(state.service.aggregation_for_period(month, year).await?))
}
