//! Manual review items for payments that could not be linked automatically.

use serde::{Deserialize, Serialize};

use super::MatchAttempt;
use crate::domain::contact::NormalizedEmail;
use crate::domain::foundation::{ProgramCode, ReviewItemId, Timestamp};

/// Why a payment needs a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualReviewReason {
    /// No strategy found exactly one unlinked profile.
    NoMatch,
    /// A profile matched but nothing in the request has a billable rate.
    NotBillable,
    /// The payment arrived after its subscription was canceled.
    SubscriptionEnded,
}

impl ManualReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualReviewReason::NoMatch => "no_match",
            ManualReviewReason::NotBillable => "not_billable",
            ManualReviewReason::SubscriptionEnded => "subscription_ended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_match" => Some(ManualReviewReason::NoMatch),
            "not_billable" => Some(ManualReviewReason::NotBillable),
            "subscription_ended" => Some(ManualReviewReason::SubscriptionEnded),
            _ => None,
        }
    }
}

/// A payment waiting to be linked by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualReviewItem {
    pub id: ReviewItemId,
    pub event_id: String,
    pub program: ProgramCode,
    pub stripe_subscription_id: String,
    /// Payer email exactly as received.
    pub payer_email: Option<String>,
    pub attempts: Vec<MatchAttempt>,
    /// Validated email of a known person, kept for manual linking.
    pub retained_email: Option<NormalizedEmail>,
    pub reason: ManualReviewReason,
    pub created_at: Timestamp,
}

impl ManualReviewItem {
    pub fn new(
        event_id: impl Into<String>,
        program: ProgramCode,
        stripe_subscription_id: impl Into<String>,
        reason: ManualReviewReason,
    ) -> Self {
        Self {
            id: ReviewItemId::new(),
            event_id: event_id.into(),
            program,
            stripe_subscription_id: stripe_subscription_id.into(),
            payer_email: None,
            attempts: Vec::new(),
            retained_email: None,
            reason,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_payer_email(mut self, payer_email: Option<String>) -> Self {
        self.payer_email = payer_email;
        self
    }

    pub fn with_attempts(mut self, attempts: Vec<MatchAttempt>) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_retained_email(mut self, email: Option<NormalizedEmail>) -> Self {
        self.retained_email = email;
        self
    }
}
