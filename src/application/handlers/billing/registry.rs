//! Wiring of the Stripe event handlers over a set of ports.

use std::sync::Arc;

use super::{
    BillingAssignmentReconciler, CheckoutCompletedHandler, PersonLookup, ProfileMatcher,
    SubscriptionChangedHandler,
};
use crate::domain::billing::RateTable;
use crate::domain::foundation::ProgramCode;
use crate::domain::payments::HandlerRegistry;
use crate::ports::{BillingStore, EnrollmentReader, ManualReviewQueue};

/// Ports and settings the webhook handlers need.
#[derive(Clone)]
pub struct BillingPorts {
    pub enrollment: Arc<dyn EnrollmentReader>,
    pub billing: Arc<dyn BillingStore>,
    pub review_queue: Arc<dyn ManualReviewQueue>,
    pub rates: RateTable,
    pub default_program: ProgramCode,
}

impl BillingPorts {
    pub fn profile_matcher(&self) -> ProfileMatcher {
        ProfileMatcher::new(PersonLookup::new(self.enrollment.clone()), self.billing.clone())
    }

    pub fn reconciler(&self) -> BillingAssignmentReconciler {
        BillingAssignmentReconciler::new(self.billing.clone())
    }

    /// Registry handling checkout completion and subscription lifecycle events.
    pub fn handler_registry(&self) -> HandlerRegistry {
        HandlerRegistry::new()
            .register(Arc::new(CheckoutCompletedHandler::new(
                self.profile_matcher(),
                self.reconciler(),
                self.enrollment.clone(),
                self.billing.clone(),
                self.review_queue.clone(),
                self.rates,
                self.default_program.clone(),
            )))
            .register(Arc::new(SubscriptionChangedHandler::new(self.reconciler())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryBillingStore, InMemoryEnrollmentStore, InMemoryReviewQueue,
    };
    use crate::domain::payments::{StripeEventType, WebhookDispatcher};

    #[test]
    fn registry_covers_billing_event_types() {
        let ports = BillingPorts {
            enrollment: Arc::new(InMemoryEnrollmentStore::new()),
            billing: Arc::new(InMemoryBillingStore::new()),
            review_queue: Arc::new(InMemoryReviewQueue::new()),
            rates: RateTable::STANDARD,
            default_program: ProgramCode::new("MAHAD").unwrap(),
        };
        let registry = ports.handler_registry();

        for event_type in [
            StripeEventType::CheckoutSessionCompleted,
            StripeEventType::CustomerSubscriptionUpdated,
            StripeEventType::CustomerSubscriptionDeleted,
        ] {
            assert!(registry.get_handler(&event_type).is_some());
        }
        assert!(registry.get_handler(&StripeEventType::Unknown).is_none());
    }
}
