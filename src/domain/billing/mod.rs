//! Billing domain module.
//!
//! Tuition rates, subscriptions, and the assignments linking enrollments to
//! the subscriptions that pay for them.
//!
//! # Module Structure
//!
//! - `rate` - Tuition rate table and pure rate calculation
//! - `subscription` - Provider subscription records
//! - `assignment` - Billing assignments and write planning
//! - `errors` - Reconciliation error taxonomy

mod assignment;
mod errors;
mod rate;
mod subscription;

pub use assignment::{
    plan_assignment, AssignmentPlan, AssignmentRequest, BillingAssignment, DeactivationReason,
};
pub use errors::BillingError;
pub use rate::{calculate_rate, Cents, RateTable};
pub use subscription::{Subscription, SubscriptionLink, SubscriptionStatus};
