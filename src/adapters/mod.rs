//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-process stores for tests and local development
//! - `postgres` - sqlx-backed persistence
//! - `http` - axum routes for Stripe webhooks

pub mod http;
pub mod memory;
pub mod postgres;
