//! PostgreSQL implementation of ManualReviewQueue.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::matching::ManualReviewItem;
use crate::ports::ManualReviewQueue;

#[derive(Clone)]
pub struct PostgresReviewQueue {
    pool: PgPool,
}

impl PostgresReviewQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManualReviewQueue for PostgresReviewQueue {
    async fn enqueue(&self, item: &ManualReviewItem) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_review_queue (
                id, event_id, program, stripe_subscription_id, payer_email,
                attempts, retained_email, reason, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.event_id)
        .bind(item.program.as_str())
        .bind(&item.stripe_subscription_id)
        .bind(&item.payer_email)
        .bind(Json(&item.attempts))
        .bind(item.retained_email.as_ref().map(|e| e.as_str()))
        .bind(item.reason.as_str())
        .bind(item.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to enqueue review item: {}", e)))?;

        Ok(())
    }
}
