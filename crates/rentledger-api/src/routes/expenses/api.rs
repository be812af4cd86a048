//! Expenses API endpoints - JSON API

use axum::http::StatusCode;
use axum::Json;
use rentledger_core::{ExpenseFact, NewExpense};

use crate::error::ApiResult;
use crate::AppState;

pub async fn api_expenses(state: axum::extract::State<AppState>) -> ApiResult<Json<Vec<ExpenseFact>>> {
    Ok(Json(state.service.list_expenses().await?))
}

pub async fn api_create_expense(
    state: axum::extract::State<AppState>,
    Json(expense): Json<NewExpense>,
) -> ApiResult<(StatusCode, Json<ExpenseFact>)> {
    let expense = state.service.record_expense(expense).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}
