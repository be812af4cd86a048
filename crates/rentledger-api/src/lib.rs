//! HTTP JSON API
//!
//! Routes are organized into modules:
//! - routes::summaries: Monthly tax summaries and annual totals
//! - routes::payments: Rent payments
//! - routes::expenses: Utility and maintenance expenses
//! - routes::recompute: Stale-summary reports
//! - routes::settings: Configuration display

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use rentledger_config::Config;
use rentledger_core::TaxService;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaxService>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::expenses::{api_create_expense, api_expenses};
    use routes::payments::{api_create_payment, api_delete_payment, api_payments, api_update_payment_status};
    use routes::recompute::api_recompute_failures;
    use routes::settings::api_settings;
    use routes::summaries::{api_annual_report, api_calculate, api_preview, api_summaries, api_update_summary};

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tax-summaries", get(api_summaries))
        .route("/api/tax-summaries/calculate", post(api_calculate))
        .route("/api/tax-summaries/preview", get(api_preview))
        .route("/api/tax-summaries/annual/:year", get(api_annual_report))
        .route("/api/tax-summaries/:id", put(api_update_summary))
        .route("/api/payments", get(api_payments).post(api_create_payment))
        .route("/api/payments/:id", axum::routing::delete(api_delete_payment))
        .route("/api/payments/:id/status", put(api_update_payment_status))
        .route("/api/expenses", get(api_expenses).post(api_create_expense))
        .route("/api/recompute/failures", get(api_recompute_failures))
        .route("/api/settings", get(api_settings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Bind and serve until the listener fails
pub async fn start_server(config: Config, service: Arc<TaxService>) -> std::io::Result<()> {
    let addr = config.bind_address();
    let state = AppState { service, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!(target: "rentledger::api", "Starting rentledger server on http://{}", addr);
    log::info!(target: "rentledger::api", "  - /api/tax-summaries (Monthly tax summaries)");
    log::info!(target: "rentledger::api", "  - /api/payments (Rent payments)");
    log::info!(target: "rentledger::api", "  - /api/expenses (Expenses)");
    log::info!(target: "rentledger::api", "  - /api/recompute/failures (Stale summaries)");

    let result = axum::serve(listener, router).await;
    match &result {
        Ok(_) => log::info!(target: "rentledger::api", "Server stopped gracefully"),
        Err(e) => log::error!(target: "rentledger::api", "Server error: {}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use rentledger_core::{MemoryStore, RecomputeWorker, Stores};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt; // for oneshot

    fn build_app() -> (Router, RecomputeWorker) {
        let config = Config::default();
        let stores = Stores::memory(Arc::new(MemoryStore::new()));
        let (service, worker) = TaxService::build(&config, stores).unwrap();
        let state = AppState {
            service: Arc::new(service),
            config,
        };
        (create_router(state), worker.unwrap())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    fn payment(id: &str, amount: &str, label: &str, status: &str) -> Value {
        json!({
            "id": id,
            "amount": amount,
            "period_label": label,
            "due_date": "2025-03-01",
            "status": status,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _worker) = build_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_calculate_and_list() {
        let (app, _worker) = build_app();
        let (status, _) = send(&app, Method::POST, "/api/payments", Some(payment("p1", "2000", "March 2025", "paid"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/expenses",
            Some(json!({"category": "Water", "amount": "150", "expense_date": "2025-03-09"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, summary) = send(
            &app,
            Method::POST,
            "/api/tax-summaries/calculate",
            Some(json!({"month": "March", "year": 2025, "tax_rate": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&summary["total_revenue"]), dec!(2000));
        assert_eq!(decimal(&summary["water"]), dec!(150));
        assert_eq!(decimal(&summary["net_income"]), dec!(1850));
        assert_eq!(decimal(&summary["tax_amount"]), dec!(370));

        let (status, list) = send(&app, Method::GET, "/api/tax-summaries?year=2025", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total_count"], 1);
        assert_eq!(list["currency"], "USD");
        assert_eq!(list["summaries"][0]["id"], summary["id"]);
    }

    #[tokio::test]
    async fn test_invalid_rate_is_bad_request() {
        let (app, _worker) = build_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tax-summaries/calculate",
            Some(json!({"month": "March", "year": 2025, "tax_rate": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TAX_RATE");

        let (status, list) = send(&app, Method::GET, "/api/tax-summaries?year=2025", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total_count"], 0);
    }

    #[tokio::test]
    async fn test_non_numeric_rate_is_invalid_tax_rate() {
        let (app, _worker) = build_app();
        for rate in [json!("abc"), json!(true), json!({"percent": 10})] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/api/tax-summaries/calculate",
                Some(json!({"month": "March", "year": 2025, "tax_rate": rate})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "INVALID_TAX_RATE");
        }

        let (status, summary) = send(
            &app,
            Method::POST,
            "/api/tax-summaries/calculate",
            Some(json!({"month": "March", "year": 2025, "tax_rate": "12.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&summary["tax_rate"]), dec!(12.5));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/tax-summaries/{}", summary["id"].as_str().unwrap()),
            Some(json!({"tax_rate": "ten"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TAX_RATE");
    }

    #[tokio::test]
    async fn test_overflowing_rate_is_unprocessable() {
        let (app, _worker) = build_app();
        send(&app, Method::POST, "/api/payments", Some(payment("p1", "1000000000", "March 2025", "paid"))).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tax-summaries/calculate",
            Some(json!({"month": "March", "year": 2025, "tax_rate": 1e20})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "ARITHMETIC_OVERFLOW");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (app, _worker) = build_app();
        let (status, _) = send(&app, Method::PUT, "/api/tax-summaries/nope", Some(json!({"tax_rate": 10}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::DELETE, "/api/payments/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PAYMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_status_change_triggers_recompute() {
        let (app, mut worker) = build_app();
        send(&app, Method::POST, "/api/payments", Some(payment("p1", "1200", "March 2025", "unpaid"))).await;

        let (status, paid) = send(&app, Method::PUT, "/api/payments/p1/status", Some(json!({"status": "paid"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(paid["paid_date"].is_string());
        assert_eq!(worker.drain_pending().await, 1);

        let (_, list) = send(&app, Method::GET, "/api/tax-summaries?year=2025", None).await;
        assert_eq!(decimal(&list["summaries"][0]["total_revenue"]), dec!(1200));

        let (status, _) = send(&app, Method::PUT, "/api/payments/p1/status", Some(json!({"status": "bogus"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_label_reported_as_failure() {
        let (app, mut worker) = build_app();
        let (status, _) = send(&app, Method::POST, "/api/payments", Some(payment("p1", "500", "Rent 2025", "paid"))).await;
        assert_eq!(status, StatusCode::CREATED);
        worker.drain_pending().await;

        let (status, failures) = send(&app, Method::GET, "/api/recompute/failures", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(failures[0]["payment_id"], "p1");
        assert_eq!(failures[0]["code"], "MALFORMED_PERIOD_LABEL");
    }

    #[tokio::test]
    async fn test_preview_lists_skipped_records() {
        let (app, _worker) = build_app();
        send(&app, Method::POST, "/api/payments", Some(payment("p1", "100", "March 2025", "paid"))).await;
        send(&app, Method::POST, "/api/payments", Some(payment("p2", "100", "Marchish", "paid"))).await;

        let (status, preview) = send(&app, Method::GET, "/api/tax-summaries/preview?month=mar&year=2025", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&preview["facts"]["total_revenue"]), dec!(100));
        assert_eq!(preview["skipped"][0]["record_id"], "p2");

        let (status, _) = send(&app, Method::GET, "/api/tax-summaries/preview?year=2025", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_annual_report_and_settings() {
        let (app, _worker) = build_app();
        send(&app, Method::POST, "/api/payments", Some(payment("p1", "1000", "January 2025", "paid"))).await;
        send(&app, Method::POST, "/api/payments", Some(payment("p2", "1000", "February 2025", "paid"))).await;
        for month in ["January", "February"] {
            send(&app, Method::POST, "/api/tax-summaries/calculate", Some(json!({"month": month, "year": 2025}))).await;
        }

        let (status, report) = send(&app, Method::GET, "/api/tax-summaries/annual/2025", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&report["total_revenue"]), dec!(2000));
        assert_eq!(decimal(&report["tax_amount"]), dec!(500));
        assert_eq!(report["months"], json!(["February", "January"]));
        assert_eq!(report["currency"], "USD");

        let (status, settings) = send(&app, Method::GET, "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["server"]["port"], 8081);
    }
}
