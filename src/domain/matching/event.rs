//! Payment event as seen by the matcher.

use serde::Serialize;

use crate::domain::foundation::ProgramCode;

/// The identifying fields of an inbound payment.
///
/// Values are kept raw; each match strategy normalizes the field it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentEvent {
    /// Provider event id, carried for logging.
    pub event_id: String,
    /// Program the payment is for.
    pub program: ProgramCode,
    /// Email of the account that paid (often a parent).
    pub payer_email: Option<String>,
    /// Student email typed into the checkout form.
    pub student_email: Option<String>,
    /// Student phone typed into the checkout form.
    pub student_phone: Option<String>,
    /// Provider subscription the payment funds. Profiles it already funds
    /// count as matched so a redelivered event resolves to the same child.
    pub stripe_subscription_id: Option<String>,
}

impl PaymentEvent {
    pub fn new(event_id: impl Into<String>, program: ProgramCode) -> Self {
        Self {
            event_id: event_id.into(),
            program,
            payer_email: None,
            student_email: None,
            student_phone: None,
            stripe_subscription_id: None,
        }
    }

    pub fn with_payer_email(mut self, email: impl Into<String>) -> Self {
        self.payer_email = Some(email.into());
        self
    }

    pub fn with_student_email(mut self, email: impl Into<String>) -> Self {
        self.student_email = Some(email.into());
        self
    }

    pub fn with_student_phone(mut self, phone: impl Into<String>) -> Self {
        self.student_phone = Some(phone.into());
        self
    }

    pub fn with_subscription(mut self, stripe_subscription_id: impl Into<String>) -> Self {
        self.stripe_subscription_id = Some(stripe_subscription_id.into());
        self
    }
}
