//! BillingStore port - subscriptions and billing assignments.
//!
//! Reads happen directly on the store. Every write goes through a
//! [`BillingTransaction`] so a reconcile call is all-or-nothing.
//!
//! # Storage contract
//!
//! Implementations must enforce at most one active assignment per profile
//! (a partial unique index in PostgreSQL). Losing that race surfaces as
//! `ErrorCode::ConcurrentModification`, never as a generic database error.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::billing::{
    BillingAssignment, DeactivationReason, Subscription, SubscriptionLink, SubscriptionStatus,
};
use crate::domain::foundation::{
    BillingAssignmentId, DomainError, ProgramProfileId, SubscriptionId,
};

/// Entry point for billing reads and transactions.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Active assignments of one profile, outside any transaction.
    async fn find_active_assignments_by_profile(
        &self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError>;

    /// Which of the given profiles currently have an active assignment.
    async fn find_linked_profiles(
        &self,
        profile_ids: &[ProgramProfileId],
    ) -> Result<HashSet<ProgramProfileId>, DomainError>;

    /// Subscription by provider id.
    async fn find_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Opens a unit of work.
    async fn begin(&self) -> Result<Box<dyn BillingTransaction>, DomainError>;
}

/// One open unit of work. Dropping it without commit discards the writes.
#[async_trait]
pub trait BillingTransaction: Send {
    /// Inserts the subscription or merges new provider details into it.
    async fn upsert_subscription(
        &mut self,
        link: &SubscriptionLink,
    ) -> Result<Subscription, DomainError>;

    /// Subscription by provider id, locked for the rest of the transaction.
    async fn find_subscription_for_update(
        &mut self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Active assignments of one profile, locked (`SELECT ... FOR UPDATE`).
    async fn lock_active_assignments(
        &mut self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError>;

    /// Active assignments funded by one subscription, locked.
    async fn lock_subscription_assignments(
        &mut self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<BillingAssignment>, DomainError>;

    async fn deactivate_assignment(
        &mut self,
        assignment_id: BillingAssignmentId,
        reason: DeactivationReason,
    ) -> Result<(), DomainError>;

    /// Inserts an active assignment.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the profile already has another active assignment
    /// - `DatabaseError` on persistence failure
    async fn insert_assignment(&mut self, assignment: &BillingAssignment)
        -> Result<(), DomainError>;

    async fn update_subscription_status(
        &mut self,
        subscription_id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
