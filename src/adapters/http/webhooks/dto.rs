//! Response bodies for the webhook endpoint.

use serde::Serialize;

/// Acknowledgement returned to Stripe on 2xx.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
    /// True when an earlier delivery of the same event was already handled.
    pub duplicate: bool,
}

impl WebhookAck {
    pub fn processed() -> Self {
        Self {
            received: true,
            duplicate: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            received: true,
            duplicate: true,
        }
    }
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
