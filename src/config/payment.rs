//! Payment configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::payments::StripeWebhookVerifier;

/// Payment configuration (Stripe webhooks)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
}

impl PaymentConfig {
    /// Builds the signature verifier. The secret only lives on as a
    /// `SecretString` inside it.
    pub fn webhook_verifier(&self) -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(self.stripe_webhook_secret.clone()))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        Ok(())
    }
}
