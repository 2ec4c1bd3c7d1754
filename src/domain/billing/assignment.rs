//! Billing assignments: the link between one enrollment and the
//! subscription paying for it.
//!
//! A profile has at most one active assignment at a time. Old assignments
//! are deactivated rather than deleted so billing history stays auditable.

use serde::{Deserialize, Serialize};

use super::Cents;
use crate::domain::foundation::{BillingAssignmentId, ProgramProfileId, SubscriptionId, Timestamp};

/// Why an assignment stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    /// A newer assignment replaced this one.
    Superseded,
    /// The subscription was canceled at the provider.
    SubscriptionEnded,
}

impl DeactivationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeactivationReason::Superseded => "superseded",
            DeactivationReason::SubscriptionEnded => "subscription_ended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "superseded" => Some(DeactivationReason::Superseded),
            "subscription_ended" => Some(DeactivationReason::SubscriptionEnded),
            _ => None,
        }
    }
}

/// One profile billed through one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAssignment {
    pub id: BillingAssignmentId,
    pub profile_id: ProgramProfileId,
    pub subscription_id: SubscriptionId,
    pub amount: Cents,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub deactivated_at: Option<Timestamp>,
    pub deactivation_reason: Option<DeactivationReason>,
}

impl BillingAssignment {
    /// Creates a new active assignment.
    pub fn activate(
        profile_id: ProgramProfileId,
        subscription_id: SubscriptionId,
        amount: Cents,
    ) -> Self {
        Self {
            id: BillingAssignmentId::new(),
            profile_id,
            subscription_id,
            amount,
            is_active: true,
            created_at: Timestamp::now(),
            deactivated_at: None,
            deactivation_reason: None,
        }
    }

    /// Marks the assignment inactive. Already inactive assignments keep
    /// their original deactivation details.
    pub fn deactivate(&mut self, reason: DeactivationReason, at: Timestamp) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.deactivated_at = Some(at);
        self.deactivation_reason = Some(reason);
    }

    /// Returns true if this active assignment already bills the profile
    /// through `subscription_id` for `amount`.
    pub fn is_equivalent(&self, subscription_id: SubscriptionId, amount: Cents) -> bool {
        self.is_active && self.subscription_id == subscription_id && self.amount == amount
    }
}

/// A profile to be billed through a subscription, with its per-cycle amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentRequest {
    pub profile_id: ProgramProfileId,
    pub amount: Cents,
}

impl AssignmentRequest {
    pub fn new(profile_id: ProgramProfileId, amount: Cents) -> Self {
        Self { profile_id, amount }
    }
}

/// What must happen to a profile's active assignments so that it ends up
/// billed exactly once through the requested subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentPlan {
    /// The requested assignment is already the only active one.
    Unchanged { existing: BillingAssignmentId },
    /// The requested assignment exists but stray active rows must go.
    Prune {
        keep: BillingAssignmentId,
        deactivate: Vec<BillingAssignmentId>,
    },
    /// Deactivate every listed assignment, then insert a new active one.
    Replace { deactivate: Vec<BillingAssignmentId> },
}

impl AssignmentPlan {
    /// Returns true if applying the plan writes nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, AssignmentPlan::Unchanged { .. })
    }
}

/// Plans the writes for one profile given its currently active assignments.
///
/// `(profile, subscription)` is the idempotency key: an identical active
/// assignment is left alone. The same subscription with a different amount
/// is replaced so the old amount stays in history.
pub fn plan_assignment(
    active: &[BillingAssignment],
    subscription_id: SubscriptionId,
    amount: Cents,
) -> AssignmentPlan {
    let active: Vec<&BillingAssignment> = active.iter().filter(|a| a.is_active).collect();

    match active.iter().find(|a| a.is_equivalent(subscription_id, amount)) {
        Some(keep) => {
            let strays: Vec<BillingAssignmentId> = active
                .iter()
                .filter(|a| a.id != keep.id)
                .map(|a| a.id)
                .collect();
            if strays.is_empty() {
                AssignmentPlan::Unchanged { existing: keep.id }
            } else {
                AssignmentPlan::Prune {
                    keep: keep.id,
                    deactivate: strays,
                }
            }
        }
        None => AssignmentPlan::Replace {
            deactivate: active.iter().map(|a| a.id).collect(),
        },
    }
}
