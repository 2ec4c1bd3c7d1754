//! BillingAssignmentReconciler - the only writer of billing assignments.
//!
//! A reconcile call upserts the subscription and brings every requested
//! profile to exactly one active assignment on it, all in one transaction.
//! `(profile, subscription)` is the idempotency key, so redelivered events
//! change nothing.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::billing::{
    plan_assignment, AssignmentPlan, AssignmentRequest, BillingAssignment, BillingError,
    DeactivationReason, Subscription, SubscriptionLink, SubscriptionStatus,
};
use crate::domain::foundation::{BillingAssignmentId, DomainError, ProgramProfileId};
use crate::ports::{BillingStore, BillingTransaction};

/// What a reconcile call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub subscription: Subscription,
    pub created: Vec<BillingAssignmentId>,
    pub deactivated: Vec<BillingAssignmentId>,
    pub unchanged: Vec<ProgramProfileId>,
    /// A concurrent writer got there first with the same result.
    pub resolved_after_conflict: bool,
}

impl ReconcileSummary {
    fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            created: Vec::new(),
            deactivated: Vec::new(),
            unchanged: Vec::new(),
            resolved_after_conflict: false,
        }
    }

    /// Returns true if nothing was written.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.deactivated.is_empty()
    }
}

/// What a subscription status change did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSummary {
    /// No local record for the provider subscription.
    UnknownSubscription,
    Updated {
        subscription: Subscription,
        deactivated: Vec<BillingAssignmentId>,
    },
}

pub struct BillingAssignmentReconciler {
    store: Arc<dyn BillingStore>,
}

impl BillingAssignmentReconciler {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    /// Links every requested profile to the subscription.
    ///
    /// # Errors
    ///
    /// - `EmptyRequest` / `DuplicateProfile` for malformed requests
    /// - `SubscriptionEnded` if the subscription is already canceled
    /// - `ConcurrentModification` when another writer left a different state
    /// - `Infrastructure` on storage failure
    pub async fn reconcile(
        &self,
        link: &SubscriptionLink,
        requests: &[AssignmentRequest],
    ) -> Result<ReconcileSummary, BillingError> {
        let requests = validate(requests)?;

        match self.apply(link, &requests).await {
            Err(BillingError::ConcurrentModification(conflict)) => {
                self.resolve_conflict(link, &requests, conflict).await
            }
            result => result,
        }
    }

    /// Cancels the subscription and ends all of its assignments.
    pub async fn release_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<ReleaseSummary, BillingError> {
        self.sync_subscription_status(stripe_subscription_id, SubscriptionStatus::Canceled)
            .await
    }

    /// Records a provider status change. Terminal statuses also deactivate
    /// every assignment the subscription funds.
    pub async fn sync_subscription_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<ReleaseSummary, BillingError> {
        let mut tx = self.store.begin().await?;
        match release(tx.as_mut(), stripe_subscription_id, status).await {
            Ok(summary) => {
                tx.commit().await?;
                if let ReleaseSummary::Updated {
                    subscription,
                    deactivated,
                } = &summary
                {
                    for id in deactivated {
                        tracing::info!(
                            target: "billing.assignment",
                            action = "deactivated",
                            reason = DeactivationReason::SubscriptionEnded.as_str(),
                            assignment_id = %id,
                            subscription_id = %subscription.id,
                            "assignment ended with subscription"
                        );
                    }
                }
                Ok(summary)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err.into())
            }
        }
    }

    async fn apply(
        &self,
        link: &SubscriptionLink,
        requests: &[AssignmentRequest],
    ) -> Result<ReconcileSummary, BillingError> {
        let mut tx = self.store.begin().await?;
        match write(tx.as_mut(), link, requests).await {
            Ok(summary) => {
                tx.commit().await?;
                log_summary(&summary);
                Ok(summary)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err)
            }
        }
    }

    /// After losing a write race, succeed only if the state we wanted is
    /// already there.
    async fn resolve_conflict(
        &self,
        link: &SubscriptionLink,
        requests: &[AssignmentRequest],
        conflict: String,
    ) -> Result<ReconcileSummary, BillingError> {
        let Some(subscription) = self
            .store
            .find_subscription(&link.stripe_subscription_id)
            .await?
        else {
            return Err(BillingError::ConcurrentModification(conflict));
        };

        for request in requests {
            let active = self
                .store
                .find_active_assignments_by_profile(request.profile_id)
                .await?;
            if !plan_assignment(&active, subscription.id, request.amount).is_noop() {
                tracing::warn!(
                    target: "billing.assignment",
                    profile_id = %request.profile_id,
                    subscription_id = %subscription.id,
                    "concurrent modification left a different assignment"
                );
                return Err(BillingError::ConcurrentModification(conflict));
            }
        }

        tracing::info!(
            target: "billing.assignment",
            action = "unchanged",
            subscription_id = %subscription.id,
            profiles = requests.len(),
            "concurrent writer already reached the requested state"
        );
        let mut summary = ReconcileSummary::new(subscription);
        summary.unchanged = requests.iter().map(|r| r.profile_id).collect();
        summary.resolved_after_conflict = true;
        Ok(summary)
    }
}

/// Rejects empty and duplicate requests; returns them in lock order.
fn validate(requests: &[AssignmentRequest]) -> Result<Vec<AssignmentRequest>, BillingError> {
    if requests.is_empty() {
        return Err(BillingError::EmptyRequest);
    }
    let mut seen = HashSet::with_capacity(requests.len());
    for request in requests {
        if !seen.insert(request.profile_id) {
            return Err(BillingError::DuplicateProfile(request.profile_id));
        }
    }
    // Lock in id order so concurrent sibling events cannot deadlock.
    let mut ordered = requests.to_vec();
    ordered.sort_by_key(|r| r.profile_id);
    Ok(ordered)
}

async fn write(
    tx: &mut dyn BillingTransaction,
    link: &SubscriptionLink,
    requests: &[AssignmentRequest],
) -> Result<ReconcileSummary, BillingError> {
    let subscription = tx.upsert_subscription(link).await?;
    if subscription.status.is_terminal() {
        return Err(BillingError::SubscriptionEnded(
            subscription.stripe_subscription_id,
        ));
    }
    let mut summary = ReconcileSummary::new(subscription);

    for request in requests {
        let active = tx.lock_active_assignments(request.profile_id).await?;
        match plan_assignment(&active, summary.subscription.id, request.amount) {
            AssignmentPlan::Unchanged { .. } => summary.unchanged.push(request.profile_id),
            AssignmentPlan::Prune { deactivate, .. } => {
                for id in deactivate {
                    tx.deactivate_assignment(id, DeactivationReason::Superseded)
                        .await?;
                    summary.deactivated.push(id);
                }
                summary.unchanged.push(request.profile_id);
            }
            AssignmentPlan::Replace { deactivate } => {
                for id in deactivate {
                    tx.deactivate_assignment(id, DeactivationReason::Superseded)
                        .await?;
                    summary.deactivated.push(id);
                }
                let assignment = BillingAssignment::activate(
                    request.profile_id,
                    summary.subscription.id,
                    request.amount,
                );
                tx.insert_assignment(&assignment).await?;
                summary.created.push(assignment.id);
            }
        }
    }

    Ok(summary)
}

async fn release(
    tx: &mut dyn BillingTransaction,
    stripe_subscription_id: &str,
    status: SubscriptionStatus,
) -> Result<ReleaseSummary, DomainError> {
    let Some(mut subscription) = tx.find_subscription_for_update(stripe_subscription_id).await?
    else {
        return Ok(ReleaseSummary::UnknownSubscription);
    };

    if subscription.status != status {
        tx.update_subscription_status(subscription.id, status).await?;
        subscription.status = status;
    }

    let mut deactivated = Vec::new();
    if status.is_terminal() {
        for assignment in tx.lock_subscription_assignments(subscription.id).await? {
            tx.deactivate_assignment(assignment.id, DeactivationReason::SubscriptionEnded)
                .await?;
            deactivated.push(assignment.id);
        }
    }

    Ok(ReleaseSummary::Updated {
        subscription,
        deactivated,
    })
}

async fn rollback_quietly(tx: Box<dyn BillingTransaction>) {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(error = %err, "billing transaction rollback failed");
    }
}

fn log_summary(summary: &ReconcileSummary) {
    let subscription_id = summary.subscription.id;
    for id in &summary.deactivated {
        tracing::info!(
            target: "billing.assignment",
            action = "deactivated",
            reason = DeactivationReason::Superseded.as_str(),
            assignment_id = %id,
            %subscription_id,
            "assignment superseded"
        );
    }
    for id in &summary.created {
        tracing::info!(
            target: "billing.assignment",
            action = "created",
            assignment_id = %id,
            %subscription_id,
            "assignment created"
        );
    }
    for profile_id in &summary.unchanged {
        tracing::info!(
            target: "billing.assignment",
            action = "unchanged",
            %profile_id,
            %subscription_id,
            "assignment already in place"
        );
    }
}
