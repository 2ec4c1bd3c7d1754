//! Command handlers organized by domain module.

pub mod billing;

pub use billing::{
    BillingAssignmentReconciler, BillingPorts, CheckoutCompletedHandler, PersonEnrollments,
    PersonLookup, ProfileMatcher, ReconcileSummary, ReleaseSummary, SubscriptionChangedHandler,
};
