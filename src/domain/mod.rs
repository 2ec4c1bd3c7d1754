//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors)
//! - `contact` - Email and phone normalization
//! - `enrollment` - Persons, contact points and program profiles
//! - `billing` - Rates, subscriptions and billing assignments
//! - `matching` - Payment-to-profile matching strategies and outcomes
//! - `payments` - Stripe webhook envelope, verification and processing

pub mod billing;
pub mod contact;
pub mod enrollment;
pub mod foundation;
pub mod matching;
pub mod payments;
