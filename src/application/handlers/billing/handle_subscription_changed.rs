//! SubscriptionChangedHandler - follows provider subscription lifecycle.
//!
//! Deletion ends every assignment the subscription funds. Updates only
//! sync the status, except that a canceled status behaves like deletion.

use async_trait::async_trait;

use super::{BillingAssignmentReconciler, ReleaseSummary};
use crate::domain::billing::SubscriptionStatus;
use crate::domain::payments::{
    StripeEvent, StripeEventType, SubscriptionObject, WebhookError, WebhookEventHandler,
};

pub struct SubscriptionChangedHandler {
    reconciler: BillingAssignmentReconciler,
}

impl SubscriptionChangedHandler {
    pub fn new(reconciler: BillingAssignmentReconciler) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionChangedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::CustomerSubscriptionUpdated,
            StripeEventType::CustomerSubscriptionDeleted,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(format!("subscription: {}", e)))?;

        let status = match event.parsed_type() {
            StripeEventType::CustomerSubscriptionDeleted => SubscriptionStatus::Canceled,
            _ => subscription.local_status(),
        };

        let summary = self
            .reconciler
            .sync_subscription_status(&subscription.id, status)
            .await?;

        match summary {
            ReleaseSummary::UnknownSubscription => Err(WebhookError::Ignored(format!(
                "Unknown subscription {}",
                subscription.id
            ))),
            ReleaseSummary::Updated { deactivated, .. } => {
                tracing::info!(
                    event_id = %event.id,
                    subscription = %subscription.id,
                    status = status.as_str(),
                    deactivated = deactivated.len(),
                    "subscription status synced"
                );
                Ok(())
            }
        }
    }
}
