//! HTTP handlers for the Stripe webhook endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::domain::payments::{IdempotentWebhookProcessor, StripeWebhookVerifier, WebhookError};
use crate::ports::WebhookResult;

use super::dto::{ErrorResponse, HealthResponse, WebhookAck};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct BillingAppState {
    pub verifier: Arc<StripeWebhookVerifier>,
    pub processor: Arc<IdempotentWebhookProcessor>,
}

impl BillingAppState {
    pub fn new(verifier: StripeWebhookVerifier, processor: IdempotentWebhookProcessor) -> Self {
        Self {
            verifier: Arc::new(verifier),
            processor: Arc::new(processor),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/stripe - verify, deduplicate and dispatch a Stripe event
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| WebhookError::ParseError("Missing Stripe-Signature header".to_string()))?;

    let event = state.verifier.verify_and_parse(&body, signature)?;

    let span = tracing::info_span!(
        "stripe_webhook",
        event_id = %event.id,
        event_type = %event.event_type,
        livemode = event.livemode,
    );

    match state.processor.process(event).instrument(span).await? {
        WebhookResult::Processed => Ok(Json(WebhookAck::processed())),
        WebhookResult::AlreadyProcessed => Ok(Json(WebhookAck::duplicate())),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts webhook failures into the status Stripe acts on.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let error_code = match &self.0 {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                "INVALID_TIMESTAMP"
            }
            WebhookError::ParseError(_) => "PARSE_ERROR",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::Rejected(_) => "REJECTED",
            WebhookError::Ignored(_) => "IGNORED",
            WebhookError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            WebhookError::Database(_) => "INTERNAL_ERROR",
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "webhook request failed");
        } else if status != StatusCode::OK {
            tracing::warn!(error = %self.0, "webhook request rejected");
        }

        // Stripe only needs the status; keep storage details out of the body.
        let message = match &self.0 {
            WebhookError::Database(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
