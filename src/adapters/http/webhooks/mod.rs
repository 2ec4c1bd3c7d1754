//! HTTP adapter for the Stripe webhook endpoint.
//!
//! - `POST /webhooks/stripe` - Handle Stripe webhooks
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{BillingAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{billing_router, webhook_routes};
