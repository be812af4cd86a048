//! Payment routes

pub mod api;

pub use api::{api_create_payment, api_delete_payment, api_payments, api_update_payment_status};
