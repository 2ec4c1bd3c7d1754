//! Extraction of payment details from Stripe checkout sessions and
//! subscription objects.

use serde::Deserialize;
use std::collections::HashMap;

use super::WebhookError;
use crate::domain::billing::{SubscriptionLink, SubscriptionStatus};
use crate::domain::contact::NormalizedEmail;
use crate::domain::foundation::ProgramCode;
use crate::domain::matching::PaymentEvent;

/// Custom field and metadata key holding the student's email.
pub const STUDENT_EMAIL_KEY: &str = "student_email";
/// Custom field and metadata key holding the student's phone.
pub const STUDENT_PHONE_KEY: &str = "student_phone";
/// Metadata key naming the program.
pub const PROGRAM_KEY: &str = "program";
/// Metadata key that turns on family billing when set to `family`.
pub const BILLING_SCOPE_KEY: &str = "billing_scope";

/// The subset of a Checkout Session object reconciliation needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// A checkout custom field. Only text and numeric values are read.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub key: String,
    #[serde(default)]
    pub text: Option<CustomFieldValue>,
    #[serde(default)]
    pub numeric: Option<CustomFieldValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldValue {
    #[serde(default)]
    pub value: Option<String>,
}

/// A completed checkout ready for matching and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPayment {
    pub event: PaymentEvent,
    pub link: SubscriptionLink,
    /// Bill the matched student's unlinked siblings through the same subscription.
    pub family_billing: bool,
}

impl CheckoutSession {
    /// Payer email, preferring what the customer typed at checkout.
    pub fn payer_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .filter(|e| !e.trim().is_empty())
            .or(self.customer_email.as_deref())
    }

    /// Value of a custom field, falling back to metadata under the same key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| {
                f.text
                    .as_ref()
                    .and_then(|v| v.value.as_deref())
                    .or_else(|| f.numeric.as_ref().and_then(|v| v.value.as_deref()))
            })
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.metadata.get(key).map(String::as_str))
    }

    pub fn is_family_billing(&self) -> bool {
        self.metadata
            .get(BILLING_SCOPE_KEY)
            .is_some_and(|scope| scope.trim().eq_ignore_ascii_case("family"))
    }

    /// Turns the session into a payment to reconcile.
    ///
    /// # Errors
    ///
    /// - `Ignored` for one-off payments (mode other than subscription)
    /// - `MissingField("subscription")` when no subscription was created
    pub fn into_payment(
        self,
        event_id: &str,
        default_program: &ProgramCode,
    ) -> Result<CheckoutPayment, WebhookError> {
        if let Some(mode) = self.mode.as_deref() {
            if mode != "subscription" {
                return Err(WebhookError::Ignored(format!(
                    "Checkout session {} has mode {}",
                    self.id, mode
                )));
            }
        }

        let subscription_id = self
            .subscription
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingField("subscription"))?;

        let program = self
            .metadata
            .get(PROGRAM_KEY)
            .and_then(|p| ProgramCode::new(p.as_str()).ok())
            .unwrap_or_else(|| default_program.clone());

        let mut event = PaymentEvent::new(event_id, program).with_subscription(subscription_id);
        event.payer_email = self.payer_email().map(str::to_string);
        event.student_email = self.field(STUDENT_EMAIL_KEY).map(str::to_string);
        event.student_phone = self.field(STUDENT_PHONE_KEY).map(str::to_string);

        let mut link = SubscriptionLink::new(subscription_id);
        if let Some(customer) = self.customer.as_deref() {
            link = link.with_customer(customer);
        }
        if let Some(email) = self.payer_email().and_then(NormalizedEmail::parse) {
            link = link.with_payer_email(email);
        }

        Ok(CheckoutPayment {
            event,
            link,
            family_billing: self.is_family_billing(),
        })
    }
}

/// The subset of a Subscription object needed to follow its lifecycle.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub status: String,
}

impl SubscriptionObject {
    pub fn local_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_stripe(&self.status)
    }
}
