//! Payments domain module.
//!
//! Stripe webhook envelope, signature verification, idempotent processing
//! and extraction of checkout details.

mod checkout;
mod stripe_event;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use checkout::{
    CheckoutPayment, CheckoutSession, CustomField, CustomFieldValue, CustomerDetails,
    SubscriptionObject, BILLING_SCOPE_KEY, PROGRAM_KEY, STUDENT_EMAIL_KEY, STUDENT_PHONE_KEY,
};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    HandlerRegistry, IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler,
};
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};
