//! Axum router configuration for the billing service.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{handle_stripe_webhook, health, BillingAppState};

/// Create the Stripe webhook router.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks (no auth, signature verified)
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete billing router.
///
/// # Example
///
/// ```ignore
/// let app = billing_router().with_state(BillingAppState::new(verifier, processor));
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::payments::{
        HandlerRegistry, IdempotentWebhookProcessor, StripeWebhookVerifier,
    };

    const SECRET: &str = "whsec_router_test";

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(SECRET.to_string()))
    }

    fn app() -> Router {
        let processor = IdempotentWebhookProcessor::new(
            Arc::new(InMemoryWebhookEventRepository::new()),
            Arc::new(HandlerRegistry::new()),
        );
        billing_router().with_state(BillingAppState::new(verifier(), processor))
    }

    fn unhandled_event(id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": id,
            "type": "invoice.paid",
            "created": 1_700_000_000,
            "data": { "object": {} },
            "livemode": false
        }))
        .unwrap()
    }

    fn signed_request(payload: Vec<u8>) -> Request<Body> {
        let header = verifier()
            .signature_header(chrono::Utc::now().timestamp(), &payload)
            .unwrap();
        Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Stripe-Signature", header)
            .header("Content-Type", "application/json")
            .body(Body::from(payload))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn signed_event_is_acknowledged_then_reported_duplicate() {
        let app = app();

        let first = app
            .clone()
            .oneshot(signed_request(unhandled_event("evt_router_1")))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["duplicate"], false);

        let second = app
            .oneshot(signed_request(unhandled_event("evt_router_1")))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_json(second).await["duplicate"], true);
    }

    #[tokio::test]
    async fn missing_signature_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .body(Body::from(unhandled_event("evt_router_2")))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tampered_payload_is_unauthorized() {
        let header = verifier()
            .signature_header(chrono::Utc::now().timestamp(), b"{\"id\":\"evt_original\"}")
            .unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Stripe-Signature", header)
            .body(Body::from(unhandled_event("evt_router_3")))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error_code"], "INVALID_SIGNATURE");
    }
}
