//! Billing reconciliation handlers.
//!
//! - `PersonLookup` - contact to persons and enrollments
//! - `ProfileMatcher` - payment to exactly one unlinked profile
//! - `BillingAssignmentReconciler` - transactional assignment writes
//! - `CheckoutCompletedHandler` / `SubscriptionChangedHandler` - Stripe event handlers
//! - `BillingPorts` - wires the handlers into a registry

mod handle_checkout_completed;
mod handle_subscription_changed;
mod person_lookup;
mod profile_matcher;
mod reconciler;
mod registry;

pub use handle_checkout_completed::CheckoutCompletedHandler;
pub use handle_subscription_changed::SubscriptionChangedHandler;
pub use person_lookup::{PersonEnrollments, PersonLookup};
pub use profile_matcher::ProfileMatcher;
pub use reconciler::{BillingAssignmentReconciler, ReconcileSummary, ReleaseSummary};
pub use registry::BillingPorts;
