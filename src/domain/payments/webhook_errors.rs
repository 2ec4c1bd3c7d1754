//! Webhook error types for Stripe webhook handling.
//!
//! Each variant carries its HTTP status and retry semantics. Stripe retries
//! any non-2xx response, so only conditions that can heal on their own are
//! marked retryable.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::billing::BillingError;
use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The reconciler refused the request it was given.
    #[error("Reconciliation rejected: {0}")]
    Rejected(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Another delivery changed the same profiles first.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if Stripe should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::ConcurrentModification(_)
        )
    }

    /// Maps the error to the status returned to Stripe.
    ///
    /// - 2xx: acknowledged, no retry
    /// - 4xx: client error, no retry
    /// - 5xx: server error, Stripe retries
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::Rejected(_)
            | WebhookError::ConcurrentModification(_)
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        if err.is_concurrent_modification() {
            WebhookError::ConcurrentModification(err.message)
        } else {
            WebhookError::Database(err.to_string())
        }
    }
}

impl From<BillingError> for WebhookError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::ConcurrentModification(msg) => WebhookError::ConcurrentModification(msg),
            BillingError::Infrastructure(err) => WebhookError::Database(err.to_string()),
            other => WebhookError::Rejected(other.to_string()),
        }
    }
}
