//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Enrollment Ports
//!
//! - `EnrollmentReader` - Persons, contact points and program profiles
//!
//! ## Billing Ports
//!
//! - `BillingStore` / `BillingTransaction` - Subscriptions and assignments
//! - `ManualReviewQueue` - Payments left for staff to link
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Stripe webhook idempotency tracking

mod billing_store;
mod enrollment_reader;
mod manual_review_queue;
mod webhook_event_repository;

pub use billing_store::{BillingStore, BillingTransaction};
pub use enrollment_reader::EnrollmentReader;
pub use manual_review_queue::ManualReviewQueue;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome, WebhookResult,
};
