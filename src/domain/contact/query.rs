//! Contact lookup query.

use serde::Serialize;

use super::{NormalizedEmail, NormalizedPhone};

/// Normalized contact values used to find a person.
///
/// At least one of email or phone is always present; the constructor refuses
/// to build an empty query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactQuery {
    email: Option<NormalizedEmail>,
    phone: Option<NormalizedPhone>,
}

impl ContactQuery {
    /// Builds a query from optional normalized values.
    ///
    /// Returns `None` if both are absent.
    pub fn new(email: Option<NormalizedEmail>, phone: Option<NormalizedPhone>) -> Option<Self> {
        if email.is_none() && phone.is_none() {
            return None;
        }
        Some(Self { email, phone })
    }

    /// Query by email only.
    pub fn by_email(email: NormalizedEmail) -> Self {
        Self {
            email: Some(email),
            phone: None,
        }
    }

    /// Query by phone only.
    pub fn by_phone(phone: NormalizedPhone) -> Self {
        Self {
            email: None,
            phone: Some(phone),
        }
    }

    pub fn email(&self) -> Option<&NormalizedEmail> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> Option<&NormalizedPhone> {
        self.phone.as_ref()
    }
}
