//! In-memory adapters for tests and local development.
//!
//! Not for production: state lives only as long as the process.

mod billing;
mod enrollment;
mod review_queue;
mod webhook_events;

pub use billing::InMemoryBillingStore;
pub use enrollment::InMemoryEnrollmentStore;
pub use review_queue::InMemoryReviewQueue;
pub use webhook_events::InMemoryWebhookEventRepository;
