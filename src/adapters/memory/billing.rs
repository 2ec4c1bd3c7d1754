//! In-memory billing store for tests and local development.
//!
//! A transaction takes the writer lock, works on a copy of the committed
//! state and swaps it back on commit. The one-active-assignment rule is
//! checked on insert, mirroring the partial unique index in PostgreSQL.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::billing::{
    BillingAssignment, Cents, DeactivationReason, Subscription, SubscriptionLink,
    SubscriptionStatus,
};
use crate::domain::foundation::{
    BillingAssignmentId, DomainError, ErrorCode, ProgramProfileId, SubscriptionId, Timestamp,
};
use crate::ports::{BillingStore, BillingTransaction};

#[derive(Debug, Clone, Default)]
struct BillingState {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    assignments: Vec<BillingAssignment>,
}

impl BillingState {
    fn subscription_by_stripe_id(&self, stripe_subscription_id: &str) -> Option<&Subscription> {
        self.subscriptions
            .values()
            .find(|s| s.stripe_subscription_id == stripe_subscription_id)
    }

    fn upsert_subscription(&mut self, link: &SubscriptionLink) -> Subscription {
        let existing = self
            .subscription_by_stripe_id(&link.stripe_subscription_id)
            .map(|s| s.id);
        let subscription = match existing.and_then(|id| self.subscriptions.get_mut(&id)) {
            Some(subscription) => {
                subscription.merge_link(link);
                subscription.clone()
            }
            None => Subscription::from_link(link),
        };
        self.subscriptions
            .insert(subscription.id, subscription.clone());
        subscription
    }

    fn active_for_profile(&self, profile_id: ProgramProfileId) -> Vec<BillingAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.is_active && a.profile_id == profile_id)
            .cloned()
            .collect()
    }

    fn insert_assignment(&mut self, assignment: &BillingAssignment) -> Result<(), DomainError> {
        if assignment.is_active
            && self
                .assignments
                .iter()
                .any(|a| a.is_active && a.profile_id == assignment.profile_id)
        {
            return Err(DomainError::concurrent_modification(
                "billing_assignments_one_active_per_profile",
            ));
        }
        self.assignments.push(assignment.clone());
        Ok(())
    }
}

/// Billing store backed by in-process state.
#[derive(Default)]
pub struct InMemoryBillingStore {
    committed: Arc<RwLock<BillingState>>,
    writer: Arc<Mutex<()>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every assignment ever written for a profile, active or not.
    pub async fn assignment_history(&self, profile_id: ProgramProfileId) -> Vec<BillingAssignment> {
        self.committed
            .read()
            .await
            .assignments
            .iter()
            .filter(|a| a.profile_id == profile_id)
            .cloned()
            .collect()
    }

    /// Writes an active assignment directly, outside any transaction.
    ///
    /// Existing active assignments of the profile are superseded first.
    pub async fn seed_assignment(
        &self,
        link: &SubscriptionLink,
        profile_id: ProgramProfileId,
        amount: Cents,
    ) -> BillingAssignment {
        let mut state = self.committed.write().await;
        let subscription = state.upsert_subscription(link);
        let now = Timestamp::now();
        for existing in state
            .assignments
            .iter_mut()
            .filter(|a| a.is_active && a.profile_id == profile_id)
        {
            existing.deactivate(DeactivationReason::Superseded, now);
        }
        let assignment = BillingAssignment::activate(profile_id, subscription.id, amount);
        state.assignments.push(assignment.clone());
        assignment
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn find_active_assignments_by_profile(
        &self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        Ok(self.committed.read().await.active_for_profile(profile_id))
    }

    async fn find_linked_profiles(
        &self,
        profile_ids: &[ProgramProfileId],
    ) -> Result<HashSet<ProgramProfileId>, DomainError> {
        let wanted: HashSet<&ProgramProfileId> = profile_ids.iter().collect();
        Ok(self
            .committed
            .read()
            .await
            .assignments
            .iter()
            .filter(|a| a.is_active && wanted.contains(&a.profile_id))
            .map(|a| a.profile_id)
            .collect())
    }

    async fn find_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .committed
            .read()
            .await
            .subscription_by_stripe_id(stripe_subscription_id)
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn BillingTransaction>, DomainError> {
        let guard = self.writer.clone().lock_owned().await;
        let working = self.committed.read().await.clone();
        Ok(Box::new(InMemoryBillingTransaction {
            committed: self.committed.clone(),
            working,
            _guard: guard,
        }))
    }
}

struct InMemoryBillingTransaction {
    committed: Arc<RwLock<BillingState>>,
    working: BillingState,
    _guard: OwnedMutexGuard<()>,
}

impl InMemoryBillingTransaction {
    fn assignment_mut(
        &mut self,
        assignment_id: BillingAssignmentId,
    ) -> Result<&mut BillingAssignment, DomainError> {
        self.working
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Assignment {} not found", assignment_id),
                )
            })
    }
}

#[async_trait]
impl BillingTransaction for InMemoryBillingTransaction {
    async fn upsert_subscription(
        &mut self,
        link: &SubscriptionLink,
    ) -> Result<Subscription, DomainError> {
        Ok(self.working.upsert_subscription(link))
    }

    async fn find_subscription_for_update(
        &mut self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .working
            .subscription_by_stripe_id(stripe_subscription_id)
            .cloned())
    }

    async fn lock_active_assignments(
        &mut self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        Ok(self.working.active_for_profile(profile_id))
    }

    async fn lock_subscription_assignments(
        &mut self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|a| a.is_active && a.subscription_id == subscription_id)
            .cloned()
            .collect())
    }

    async fn deactivate_assignment(
        &mut self,
        assignment_id: BillingAssignmentId,
        reason: DeactivationReason,
    ) -> Result<(), DomainError> {
        self.assignment_mut(assignment_id)?
            .deactivate(reason, Timestamp::now());
        Ok(())
    }

    async fn insert_assignment(
        &mut self,
        assignment: &BillingAssignment,
    ) -> Result<(), DomainError> {
        self.working.insert_assignment(assignment)
    }

    async fn update_subscription_status(
        &mut self,
        subscription_id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let subscription = self
            .working
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!("Subscription {} not found", subscription_id),
                )
            })?;
        subscription.status = status;
        subscription.updated_at = Timestamp::now();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        *this.committed.write().await = this.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}
