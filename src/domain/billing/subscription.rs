//! Recurring payment instruments held at the payment provider.

use serde::{Deserialize, Serialize};

use crate::domain::contact::NormalizedEmail;
use crate::domain::foundation::{SubscriptionId, Timestamp};

/// Provider-side status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Incomplete,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    /// Maps a Stripe subscription status string.
    ///
    /// Statuses the billing core does not distinguish collapse onto the
    /// nearest equivalent.
    pub fn from_stripe(s: &str) -> Self {
        match s {
            "active" | "trialing" => SubscriptionStatus::Active,
            "past_due" | "unpaid" => SubscriptionStatus::PastDue,
            "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Incomplete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "incomplete" => Some(SubscriptionStatus::Incomplete),
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }

    /// Returns true once the subscription will never charge again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Canceled)
    }
}

/// Local record of a provider subscription.
///
/// One subscription may fund several profiles (family billing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub stripe_subscription_id: String,
    pub stripe_customer_id: Option<String>,
    pub payer_email: Option<NormalizedEmail>,
    pub status: SubscriptionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a new local record for a provider subscription.
    pub fn from_link(link: &SubscriptionLink) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            stripe_subscription_id: link.stripe_subscription_id.clone(),
            stripe_customer_id: link.stripe_customer_id.clone(),
            payer_email: link.payer_email.clone(),
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fills in provider details learned from a later event.
    ///
    /// Known values are never blanked out.
    pub fn merge_link(&mut self, link: &SubscriptionLink) {
        if link.stripe_customer_id.is_some() {
            self.stripe_customer_id = link.stripe_customer_id.clone();
        }
        if link.payer_email.is_some() {
            self.payer_email = link.payer_email.clone();
        }
        self.updated_at = Timestamp::now();
    }
}

/// Provider identifiers carried by a payment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionLink {
    pub stripe_subscription_id: String,
    pub stripe_customer_id: Option<String>,
    pub payer_email: Option<NormalizedEmail>,
}

impl SubscriptionLink {
    pub fn new(stripe_subscription_id: impl Into<String>) -> Self {
        Self {
            stripe_subscription_id: stripe_subscription_id.into(),
            stripe_customer_id: None,
            payer_email: None,
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.stripe_customer_id = Some(customer_id.into());
        self
    }

    pub fn with_payer_email(mut self, email: NormalizedEmail) -> Self {
        self.payer_email = Some(email);
        self
    }
}
