//! Application layer - services and handlers.
//!
//! Orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    BillingAssignmentReconciler, BillingPorts, CheckoutCompletedHandler, PersonEnrollments,
    PersonLookup, ProfileMatcher, ReconcileSummary, ReleaseSummary, SubscriptionChangedHandler,
};
