//! Error types for rentledger-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rentledger_core::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => status_for(e.code()),
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::BadRequest { message } => serde_json::json!({
                "code": "BAD_REQUEST",
                "message": message,
                "suggestions": [],
            }),
            ApiError::Core(e) => serde_json::to_value(e.to_details()).unwrap_or_default(),
        }
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MalformedPeriodLabel
        | ErrorCode::InvalidPeriod
        | ErrorCode::InvalidTaxRate
        | ErrorCode::InvalidAmount => StatusCode::BAD_REQUEST,
        ErrorCode::PaymentNotFound | ErrorCode::SummaryNotFound => StatusCode::NOT_FOUND,
        ErrorCode::DuplicateEntry => StatusCode::CONFLICT,
        ErrorCode::ArithmeticOverflow => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::QueueUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::ReconciliationWriteFailure
        | ErrorCode::AggregationPartialFailure
        | ErrorCode::RecomputeAborted
        | ErrorCode::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "rentledger::api", "{}", self);
        } else {
            log::debug!(target: "rentledger::api", "{}", self);
        }
        (status, Json(self.body())).into_response()
    }
}
