//! Payments API endpoints - JSON API
//!
//! Every write here may queue a recompute of the payment's period.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rentledger_core::{NewPayment, PaymentFact, PaymentStatus};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

pub async fn api_payments(state: axum::extract::State<AppState>) -> ApiResult<Json<Vec<PaymentFact>>> {
    Ok(Json(state.service.list_payments().await?))
}

pub async fn api_create_payment(
    state: axum::extract::State<AppState>,
    Json(payment): Json<NewPayment>,
) -> ApiResult<(StatusCode, Json<PaymentFact>)> {
    let payment = state.service.record_payment(payment).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn api_update_payment_status(
    state: axum::extract::State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<PaymentFact>> {
    let status: PaymentStatus = request.status.parse().map_err(ApiError::bad_request)?;
    let payment = state
        .service
        .set_payment_status(&id, status, request.paid_date)
        .await?;
    Ok(Json(payment))
}

pub async fn api_delete_payment(
    state: axum::extract::State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PaymentFact>> {
    Ok(Json(state.service.delete_payment(&id).await?))
}
