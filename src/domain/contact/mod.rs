//! Contact domain module.
//!
//! Canonical email/phone values and the query type used to resolve them to
//! people.

mod normalizer;
mod query;

pub use normalizer::{
    normalize_email, normalize_phone, NormalizedEmail, NormalizedPhone, MIN_PHONE_DIGITS,
};
pub use query::ContactQuery;
