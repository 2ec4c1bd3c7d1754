//! Webhook processor - idempotent routing of Stripe events to handlers.
//!
//! 1. Skip events already recorded for this event id
//! 2. Dispatch to the handler registered for the event type
//! 3. Record success, ignored or permanent failure
//!
//! Retryable failures are not recorded, so Stripe's redelivery runs the
//! handler again. When two deliveries race, the primary key on event id
//! picks the winner and the loser reports `AlreadyProcessed`.

use async_trait::async_trait;
use std::sync::Arc;

use super::{StripeEvent, StripeEventType, WebhookError};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookResult};

/// Handler for one or more Stripe event types.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Event types this handler processes.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Returns `Err(WebhookError::Ignored(_))` for events that should be
    /// acknowledged without effect.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Routes events to handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler>;

    /// Returns `Err(WebhookError::Ignored)` if no handler is registered.
    async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "No handler for event type: {}",
                event.event_type
            ))),
        }
    }
}

/// Dispatcher over a fixed list of handlers; the first one claiming a type wins.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }
}

#[async_trait]
impl WebhookDispatcher for HandlerRegistry {
    fn get_handler(&self, event_type: &StripeEventType) -> Option<&dyn WebhookEventHandler> {
        if *event_type == StripeEventType::Unknown {
            return None;
        }
        self.handlers
            .iter()
            .find(|h| h.handles().contains(event_type))
            .map(|h| h.as_ref())
    }
}

/// Processes webhook events at most once per event id.
pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl IdempotentWebhookProcessor {
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Processes a verified event.
    ///
    /// # Returns
    ///
    /// - `Ok(Processed)` - handled or ignored, and recorded
    /// - `Ok(AlreadyProcessed)` - a previous delivery was recorded
    /// - `Err(_)` - handling failed; retryable errors leave no record
    pub async fn process(&self, event: StripeEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "webhook already processed");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let result = self.dispatcher.dispatch(&event).await;

        if let Err(err) = &result {
            if err.is_retryable() {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %err,
                    "webhook failed, awaiting redelivery"
                );
                return result.map(|()| WebhookResult::Processed);
            }
        }

        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(format!("Failed to serialize event: {}", e)))?;
        let record = match &result {
            Ok(()) => WebhookEventRecord::success(&event.id, &event.event_type, payload),
            Err(WebhookError::Ignored(reason)) => {
                WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload)
            }
            Err(e) => WebhookEventRecord::failed(&event.id, &event.event_type, e.to_string(), payload),
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => match result {
                Ok(()) | Err(WebhookError::Ignored(_)) => Ok(WebhookResult::Processed),
                Err(e) => Err(e),
            },
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}
