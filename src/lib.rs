//! Tuition Billing - payment-event reconciliation for school enrollment
//!
//! Links incoming Stripe payments to the students they pay for. Contact
//! details from the checkout are normalized and matched against enrollment
//! records, each student's tuition is computed from the rate table, and
//! billing assignments are reconciled so every profile is funded by at most
//! one subscription.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
