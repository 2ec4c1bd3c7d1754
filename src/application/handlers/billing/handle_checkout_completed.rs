//! CheckoutCompletedHandler - links a completed checkout to enrollments.
//!
//! Flow: extract identifiers, match one profile, optionally add its
//! unlinked siblings, price each profile, then reconcile. Unresolvable
//! payments go to the manual review queue and the event is acknowledged.
//! So do payments that arrive after their subscription was canceled.

use async_trait::async_trait;
use std::sync::Arc;

use super::{BillingAssignmentReconciler, ProfileMatcher};
use crate::domain::billing::{AssignmentRequest, BillingError, RateTable};
use crate::domain::enrollment::ProgramProfile;
use crate::domain::foundation::{DomainError, ProgramCode};
use crate::domain::matching::{ManualReviewItem, ManualReviewReason, MatchOutcome};
use crate::domain::payments::{
    CheckoutPayment, CheckoutSession, StripeEvent, StripeEventType, WebhookError,
    WebhookEventHandler,
};
use crate::ports::{BillingStore, EnrollmentReader, ManualReviewQueue};

pub struct CheckoutCompletedHandler {
    matcher: ProfileMatcher,
    reconciler: BillingAssignmentReconciler,
    enrollment: Arc<dyn EnrollmentReader>,
    billing: Arc<dyn BillingStore>,
    review_queue: Arc<dyn ManualReviewQueue>,
    rates: RateTable,
    default_program: ProgramCode,
}

impl CheckoutCompletedHandler {
    pub fn new(
        matcher: ProfileMatcher,
        reconciler: BillingAssignmentReconciler,
        enrollment: Arc<dyn EnrollmentReader>,
        billing: Arc<dyn BillingStore>,
        review_queue: Arc<dyn ManualReviewQueue>,
        rates: RateTable,
        default_program: ProgramCode,
    ) -> Self {
        Self {
            matcher,
            reconciler,
            enrollment,
            billing,
            review_queue,
            rates,
            default_program,
        }
    }

    async fn process(&self, payment: CheckoutPayment) -> Result<(), WebhookError> {
        let (profile, attempts) = match self.matcher.match_payment(&payment.event).await? {
            MatchOutcome::Matched {
                profile, attempts, ..
            } => (profile, attempts),
            MatchOutcome::ManualReview {
                attempts,
                retained_email,
            } => {
                let item = self
                    .review_item(&payment, ManualReviewReason::NoMatch)
                    .with_attempts(attempts)
                    .with_retained_email(retained_email);
                self.review_queue.enqueue(&item).await?;
                return Ok(());
            }
        };

        let mut profiles = vec![profile];
        if payment.family_billing {
            let siblings = self.unlinked_siblings(&profiles[0]).await?;
            profiles.extend(siblings);
        }

        let requests = self.price(&payment, &profiles);
        if requests.is_empty() {
            tracing::warn!(
                event_id = %payment.event.event_id,
                profile_id = %profiles[0].id,
                "matched profile is not billable"
            );
            let item = self
                .review_item(&payment, ManualReviewReason::NotBillable)
                .with_attempts(attempts);
            self.review_queue.enqueue(&item).await?;
            return Ok(());
        }

        match self.reconciler.reconcile(&payment.link, &requests).await {
            Ok(_) => Ok(()),
            Err(BillingError::SubscriptionEnded(subscription)) => {
                tracing::warn!(
                    event_id = %payment.event.event_id,
                    subscription = %subscription,
                    "payment arrived for a canceled subscription"
                );
                let item = self
                    .review_item(&payment, ManualReviewReason::SubscriptionEnded)
                    .with_attempts(attempts);
                self.review_queue.enqueue(&item).await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Siblings in the same program and family that nothing pays for yet.
    async fn unlinked_siblings(
        &self,
        profile: &ProgramProfile,
    ) -> Result<Vec<ProgramProfile>, DomainError> {
        let Some(family) = profile.family_reference_id.as_deref() else {
            return Ok(Vec::new());
        };

        let siblings: Vec<ProgramProfile> = self
            .enrollment
            .find_profiles_by_family(family, &profile.program)
            .await?
            .into_iter()
            .filter(|p| p.id != profile.id)
            .collect();
        if siblings.is_empty() {
            return Ok(siblings);
        }

        let ids: Vec<_> = siblings.iter().map(|p| p.id).collect();
        let linked = self.billing.find_linked_profiles(&ids).await?;
        Ok(siblings
            .into_iter()
            .filter(|p| !linked.contains(&p.id))
            .collect())
    }

    /// Rate per profile; profiles that cost nothing are left out.
    fn price(
        &self,
        payment: &CheckoutPayment,
        profiles: &[ProgramProfile],
    ) -> Vec<AssignmentRequest> {
        profiles
            .iter()
            .filter_map(|profile| {
                let amount = self.rates.rate(
                    profile.graduation_status,
                    profile.payment_frequency,
                    profile.billing_type,
                );
                if amount.is_zero() {
                    tracing::info!(
                        event_id = %payment.event.event_id,
                        profile_id = %profile.id,
                        billing_type = profile.billing_type.map(|b| b.as_str()),
                        "skipping profile with zero rate"
                    );
                    None
                } else {
                    Some(AssignmentRequest::new(profile.id, amount))
                }
            })
            .collect()
    }

    fn review_item(
        &self,
        payment: &CheckoutPayment,
        reason: ManualReviewReason,
    ) -> ManualReviewItem {
        ManualReviewItem::new(
            payment.event.event_id.as_str(),
            payment.event.program.clone(),
            payment.link.stripe_subscription_id.as_str(),
            reason,
        )
        .with_payer_email(payment.event.payer_email.clone())
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let session: CheckoutSession = event
            .deserialize_object()
            .map_err(|e| WebhookError::ParseError(format!("checkout session: {}", e)))?;
        let payment = session.into_payment(&event.id, &self.default_program)?;
        self.process(payment).await
    }
}
