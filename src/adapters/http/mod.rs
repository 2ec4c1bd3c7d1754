//! HTTP adapters - axum routes over the application layer.

pub mod webhooks;

pub use webhooks::{billing_router, BillingAppState};
