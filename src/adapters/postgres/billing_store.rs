//! PostgreSQL implementation of BillingStore.
//!
//! Transactions run at READ COMMITTED. Row locks (`FOR UPDATE`) serialize
//! writers on the same profile; the partial unique index
//! `billing_assignments_one_active_per_profile` catches the case where two
//! writers both saw no active row and both insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::billing::{
    BillingAssignment, Cents, DeactivationReason, Subscription, SubscriptionLink,
    SubscriptionStatus,
};
use crate::domain::contact::NormalizedEmail;
use crate::domain::foundation::{
    BillingAssignmentId, DomainError, ProgramProfileId, SubscriptionId, Timestamp,
};
use crate::ports::{BillingStore, BillingTransaction};

const ONE_ACTIVE_PER_PROFILE: &str = "billing_assignments_one_active_per_profile";

const SUBSCRIPTION_COLUMNS: &str = "id, stripe_subscription_id, stripe_customer_id, \
     payer_email, status, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, profile_id, subscription_id, amount_cents, is_active, \
     created_at, deactivated_at, deactivation_reason";

#[derive(Clone)]
pub struct PostgresBillingStore {
    pool: PgPool,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    stripe_subscription_id: String,
    stripe_customer_id: Option<String>,
    payer_email: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("Invalid subscription status: {}", row.status))
        })?;
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_customer_id: row.stripe_customer_id,
            payer_email: row.payer_email.map(NormalizedEmail::from_normalized),
            status,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    profile_id: Uuid,
    subscription_id: Uuid,
    amount_cents: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    deactivated_at: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
}

impl TryFrom<AssignmentRow> for BillingAssignment {
    type Error = DomainError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let deactivation_reason = match row.deactivation_reason {
            None => None,
            Some(raw) => Some(DeactivationReason::parse(&raw).ok_or_else(|| {
                DomainError::database(format!("Invalid deactivation reason: {}", raw))
            })?),
        };
        Ok(BillingAssignment {
            id: BillingAssignmentId::from_uuid(row.id),
            profile_id: ProgramProfileId::from_uuid(row.profile_id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            amount: Cents::new(row.amount_cents),
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            deactivated_at: row.deactivated_at.map(Timestamp::from_datetime),
            deactivation_reason,
        })
    }
}

fn into_assignments(rows: Vec<AssignmentRow>) -> Result<Vec<BillingAssignment>, DomainError> {
    rows.into_iter().map(BillingAssignment::try_from).collect()
}

/// Maps a write failure, surfacing the one-active-per-profile race as a
/// concurrent modification.
fn map_write_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some(ONE_ACTIVE_PER_PROFILE) {
            return DomainError::concurrent_modification(ONE_ACTIVE_PER_PROFILE);
        }
        // 40001 serialization_failure, 40P01 deadlock_detected
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            return DomainError::concurrent_modification(format!("{}: {}", context, db_err));
        }
    }
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    async fn find_active_assignments_by_profile(
        &self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM billing_assignments WHERE profile_id = $1 AND is_active",
            ASSIGNMENT_COLUMNS
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&sql)
            .bind(profile_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find assignments: {}", e)))?;
        into_assignments(rows)
    }

    async fn find_linked_profiles(
        &self,
        profile_ids: &[ProgramProfileId],
    ) -> Result<HashSet<ProgramProfileId>, DomainError> {
        if profile_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = profile_ids.iter().map(|id| *id.as_uuid()).collect();
        let linked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT profile_id FROM billing_assignments
            WHERE profile_id = ANY($1) AND is_active
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find linked profiles: {}", e)))?;

        Ok(linked.into_iter().map(ProgramProfileId::from_uuid).collect())
    }

    async fn find_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE stripe_subscription_id = $1",
            SUBSCRIPTION_COLUMNS
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(stripe_subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn begin(&self) -> Result<Box<dyn BillingTransaction>, DomainError> {
        let tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(Box::new(PostgresBillingTransaction { tx }))
    }
}

struct PostgresBillingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BillingTransaction for PostgresBillingTransaction {
    async fn upsert_subscription(
        &mut self,
        link: &SubscriptionLink,
    ) -> Result<Subscription, DomainError> {
        let fresh = Subscription::from_link(link);
        let sql = format!(
            r#"
            INSERT INTO subscriptions (
                id, stripe_subscription_id, stripe_customer_id, payer_email,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (stripe_subscription_id) DO UPDATE SET
                stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscriptions.stripe_customer_id),
                payer_email = COALESCE(EXCLUDED.payer_email, subscriptions.payer_email),
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        );
        let row: SubscriptionRow = sqlx::query_as(&sql)
            .bind(fresh.id.as_uuid())
            .bind(&fresh.stripe_subscription_id)
            .bind(&fresh.stripe_customer_id)
            .bind(fresh.payer_email.as_ref().map(|e| e.as_str()))
            .bind(fresh.status.as_str())
            .bind(fresh.created_at.as_datetime())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_write_error("Failed to upsert subscription", e))?;
        Subscription::try_from(row)
    }

    async fn find_subscription_for_update(
        &mut self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE stripe_subscription_id = $1 FOR UPDATE",
            SUBSCRIPTION_COLUMNS
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(stripe_subscription_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_write_error("Failed to lock subscription", e))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn lock_active_assignments(
        &mut self,
        profile_id: ProgramProfileId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM billing_assignments \
             WHERE profile_id = $1 AND is_active ORDER BY created_at FOR UPDATE",
            ASSIGNMENT_COLUMNS
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&sql)
            .bind(profile_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_write_error("Failed to lock assignments", e))?;
        into_assignments(rows)
    }

    async fn lock_subscription_assignments(
        &mut self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<BillingAssignment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM billing_assignments \
             WHERE subscription_id = $1 AND is_active ORDER BY profile_id FOR UPDATE",
            ASSIGNMENT_COLUMNS
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&sql)
            .bind(subscription_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_write_error("Failed to lock subscription assignments", e))?;
        into_assignments(rows)
    }

    async fn deactivate_assignment(
        &mut self,
        assignment_id: BillingAssignmentId,
        reason: DeactivationReason,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE billing_assignments SET
                is_active = false,
                deactivated_at = $2,
                deactivation_reason = $3
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(Utc::now())
        .bind(reason.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error("Failed to deactivate assignment", e))?;
        Ok(())
    }

    async fn insert_assignment(
        &mut self,
        assignment: &BillingAssignment,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO billing_assignments (
                id, profile_id, subscription_id, amount_cents, is_active,
                created_at, deactivated_at, deactivation_reason
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(assignment.profile_id.as_uuid())
        .bind(assignment.subscription_id.as_uuid())
        .bind(assignment.amount.value())
        .bind(assignment.is_active)
        .bind(assignment.created_at.as_datetime())
        .bind(assignment.deactivated_at.map(|t| *t.as_datetime()))
        .bind(assignment.deactivation_reason.map(|r| r.as_str()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error("Failed to insert assignment", e))?;
        Ok(())
    }

    async fn update_subscription_status(
        &mut self,
        subscription_id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(subscription_id.as_uuid())
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error("Failed to update subscription status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::database(format!(
                "Subscription {} not found",
                subscription_id
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_write_error("Failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.rollback().await.map_err(|e| {
            DomainError::database(format!("Failed to roll back transaction: {}", e))
        })
    }
}
