//! PostgreSQL adapters - sqlx implementations of the billing ports.
//!
//! - `PostgresEnrollmentReader` - person, contact and profile lookups
//! - `PostgresBillingStore` - subscriptions and assignments, transactional
//! - `PostgresReviewQueue` - payments awaiting manual linking
//! - `PostgresWebhookEventRepository` - processed Stripe deliveries

mod billing_store;
mod enrollment_reader;
mod review_queue;
mod webhook_event_repository;

pub use billing_store::PostgresBillingStore;
pub use enrollment_reader::PostgresEnrollmentReader;
pub use review_queue::PostgresReviewQueue;
pub use webhook_event_repository::PostgresWebhookEventRepository;
