//! Settings API endpoints - JSON API

use axum::Json;
use rentledger_config::Config;

use crate::AppState;

/// Effective configuration after defaults and file overrides
pub async fn api_settings(state: axum::extract::State<AppState>) -> Json<Config> {
    Json(state.config.clone())
}
