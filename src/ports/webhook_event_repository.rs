//! WebhookEventRepository port - tracks processed Stripe deliveries.
//!
//! Stripe redelivers an event after timeouts and 5xx responses, and may
//! deliver the same event twice even after a 200. The record keyed by event
//! id is the first line of defence; assignment planning is the second.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// How a delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Success,
    Ignored,
    Failed,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Success => "success",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(WebhookOutcome::Success),
            "ignored" => Some(WebhookOutcome::Ignored),
            "failed" => Some(WebhookOutcome::Failed),
            _ => None,
        }
    }
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,
    /// Stripe event type, e.g. "checkout.session.completed".
    pub event_type: String,
    pub processed_at: DateTime<Utc>,
    pub outcome: WebhookOutcome,
    /// Ignore reason or error text.
    pub message: Option<String>,
    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    fn with_outcome(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: WebhookOutcome,
        message: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome,
            message,
            payload,
        }
    }

    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_outcome(event_id, event_type, WebhookOutcome::Success, None, payload)
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_outcome(
            event_id,
            event_type,
            WebhookOutcome::Ignored,
            Some(reason.into()),
            payload,
        )
    }

    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_outcome(
            event_id,
            event_type,
            WebhookOutcome::Failed,
            Some(error.into()),
            payload,
        )
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Another delivery already recorded it.
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations rely on the primary key on event_id so two concurrent
/// deliveries cannot both record the event.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Returns `None` if the event hasn't been processed yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Saves with `ON CONFLICT DO NOTHING` semantics.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before `timestamp`; returns how many.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    Processed,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_has_no_message() {
        let record = WebhookEventRecord::success(
            "evt_123",
            "checkout.session.completed",
            serde_json::json!({"id": "test"}),
        );

        assert_eq!(record.event_id, "evt_123");
        assert_eq!(record.outcome, WebhookOutcome::Success);
        assert!(record.message.is_none());
    }

    #[test]
    fn ignored_record_includes_reason() {
        let record = WebhookEventRecord::ignored(
            "evt_456",
            "invoice.paid",
            "Unhandled event type",
            serde_json::json!({}),
        );

        assert_eq!(record.outcome, WebhookOutcome::Ignored);
        assert_eq!(record.message.as_deref(), Some("Unhandled event type"));
    }

    #[test]
    fn failed_record_includes_error() {
        let record = WebhookEventRecord::failed(
            "evt_789",
            "checkout.session.completed",
            "Missing subscription id",
            serde_json::json!({}),
        );

        assert_eq!(record.outcome, WebhookOutcome::Failed);
        assert_eq!(record.message.as_deref(), Some("Missing subscription id"));
    }

    #[test]
    fn outcome_strings_roundtrip() {
        for outcome in [
            WebhookOutcome::Success,
            WebhookOutcome::Ignored,
            WebhookOutcome::Failed,
        ] {
            assert_eq!(WebhookOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(WebhookOutcome::parse("pending"), None);
    }

    #[test]
    fn webhook_event_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn WebhookEventRepository) {}
    }
}
