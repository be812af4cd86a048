//! Tax summary routes

pub mod api;

pub use api::{api_annual_report, api_calculate, api_preview, api_summaries, api_update_summary};
