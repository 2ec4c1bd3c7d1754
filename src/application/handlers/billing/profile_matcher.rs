//! ProfileMatcher - maps a payment to exactly one unlinked enrollment.
//!
//! Strategies run in priority order and the first unique result wins. An
//! ambiguous strategy never matches; it falls through so a more specific
//! identifier further down can still decide.
//!
//! A profile already funded by the payment's own subscription counts as
//! the match. Redelivering an applied event therefore resolves to the same
//! profile instead of falling through to an unlinked sibling.

use std::collections::HashSet;
use std::sync::Arc;

use super::PersonLookup;
use crate::domain::contact::{ContactQuery, NormalizedEmail};
use crate::domain::enrollment::ProgramProfile;
use crate::domain::foundation::{DomainError, PersonId, ProgramProfileId};
use crate::domain::matching::{
    resolve_candidates, AttemptResult, Candidates, MatchAttempt, MatchMethod, MatchOutcome,
    MatchStrategy, PaymentEvent,
};
use crate::ports::BillingStore;

pub struct ProfileMatcher {
    lookup: PersonLookup,
    billing: Arc<dyn BillingStore>,
    strategies: Vec<MatchStrategy>,
}

impl ProfileMatcher {
    pub fn new(lookup: PersonLookup, billing: Arc<dyn BillingStore>) -> Self {
        Self::with_strategies(lookup, billing, MatchStrategy::default_order())
    }

    pub fn with_strategies(
        lookup: PersonLookup,
        billing: Arc<dyn BillingStore>,
        strategies: Vec<MatchStrategy>,
    ) -> Self {
        Self {
            lookup,
            billing,
            strategies,
        }
    }

    /// Resolves the payment to one profile or a manual review outcome.
    ///
    /// Only infrastructure failures are errors.
    pub async fn match_payment(&self, event: &PaymentEvent) -> Result<MatchOutcome, DomainError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let (attempt, matched) = self.run_strategy(strategy, event).await?;
            attempts.push(attempt);

            if let Some(profile) = matched {
                tracing::info!(
                    target: "billing.match",
                    event_id = %event.event_id,
                    program = %event.program,
                    method = %strategy.method,
                    profile_id = %profile.id,
                    "matched payment to profile"
                );
                return Ok(MatchOutcome::Matched {
                    profile,
                    method: strategy.method,
                    attempts,
                });
            }
        }

        let retained_email = retained_payer_email(&attempts);
        tracing::warn!(
            target: "billing.no_match",
            event_id = %event.event_id,
            program = %event.program,
            attempts = %serde_json::to_string(&attempts).unwrap_or_default(),
            retained_email = retained_email.as_ref().map(|e| e.as_str()),
            "payment requires manual review"
        );
        Ok(MatchOutcome::ManualReview {
            attempts,
            retained_email,
        })
    }

    /// Which of the linked profiles the payment's own subscription funds.
    ///
    /// Must run after the linked set was read: an assignment visible there
    /// was committed together with its subscription.
    async fn funded_by_payment(
        &self,
        event: &PaymentEvent,
        linked: &HashSet<ProgramProfileId>,
    ) -> Result<HashSet<ProgramProfileId>, DomainError> {
        let mut funded = HashSet::new();
        let Some(stripe_id) = event.stripe_subscription_id.as_deref() else {
            return Ok(funded);
        };
        let Some(subscription) = self.billing.find_subscription(stripe_id).await? else {
            return Ok(funded);
        };
        for profile_id in linked {
            let active = self
                .billing
                .find_active_assignments_by_profile(*profile_id)
                .await?;
            if active.iter().any(|a| a.subscription_id == subscription.id) {
                funded.insert(*profile_id);
            }
        }
        Ok(funded)
    }

    async fn run_strategy(
        &self,
        strategy: &MatchStrategy,
        event: &PaymentEvent,
    ) -> Result<(MatchAttempt, Option<ProgramProfile>), DomainError> {
        let raw = strategy.raw_identifier(event);
        let Some(query) = (strategy.extract)(event) else {
            tracing::debug!(
                event_id = %event.event_id,
                method = %strategy.method,
                present = raw.is_some(),
                "strategy skipped"
            );
            return Ok((MatchAttempt::skipped(strategy.method, raw), None));
        };

        let attempt = |result| MatchAttempt {
            method: strategy.method,
            identifier: raw.map(str::to_string),
            normalized: Some(normalized_value(&query)),
            result,
        };

        let found = self.lookup.lookup(&query, &event.program).await?;
        if found.is_empty() {
            return Ok((attempt(AttemptResult::NoPerson), None));
        }

        let persons: Vec<PersonId> = found.iter().map(|f| f.person.id).collect();
        let profiles: Vec<ProgramProfile> = found.into_iter().flat_map(|f| f.profiles).collect();
        let profiles_in_program = profiles.len();
        let profile_ids: Vec<ProgramProfileId> = profiles.iter().map(|p| p.id).collect();
        let linked = if profile_ids.is_empty() {
            HashSet::new()
        } else {
            self.billing.find_linked_profiles(&profile_ids).await?
        };
        let funded = if linked.is_empty() {
            HashSet::new()
        } else {
            self.funded_by_payment(event, &linked).await?
        };

        match resolve_candidates(profiles, &linked, &funded) {
            Candidates::AlreadyFunded(profile) => {
                tracing::debug!(
                    event_id = %event.event_id,
                    method = %strategy.method,
                    profile_id = %profile.id,
                    "subscription already funds profile"
                );
                Ok((
                    attempt(AttemptResult::AlreadyFunded {
                        profile_id: profile.id,
                    }),
                    Some(profile),
                ))
            }
            Candidates::Unique(profile) => Ok((
                attempt(AttemptResult::Matched {
                    profile_id: profile.id,
                }),
                Some(profile),
            )),
            Candidates::None => Ok((
                attempt(AttemptResult::NoUnlinkedProfile {
                    persons,
                    profiles_in_program,
                }),
                None,
            )),
            Candidates::Ambiguous(candidates) => {
                tracing::warn!(
                    target: "billing.ambiguous",
                    event_id = %event.event_id,
                    program = %event.program,
                    strategy = %strategy.method,
                    candidates = ?candidates,
                    "ambiguous match, trying next strategy"
                );
                Ok((attempt(AttemptResult::Ambiguous { candidates }), None))
            }
        }
    }
}

fn normalized_value(query: &ContactQuery) -> String {
    match (query.email(), query.phone()) {
        (Some(email), _) => email.as_str().to_string(),
        (None, Some(phone)) => phone.as_str().to_string(),
        (None, None) => String::new(),
    }
}

/// Payer email of a known person who has no profile in the program yet.
fn retained_payer_email(attempts: &[MatchAttempt]) -> Option<NormalizedEmail> {
    attempts
        .iter()
        .find(|a| a.method == MatchMethod::PayerEmail && a.found_person_without_profile())
        .and_then(|a| a.normalized.as_deref())
        .map(NormalizedEmail::from_normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBillingStore, InMemoryEnrollmentStore};
    use crate::domain::billing::{AssignmentRequest, Cents, SubscriptionLink};
    use crate::domain::contact::NormalizedPhone;
    use crate::domain::enrollment::{ContactPoint, Person};
    use crate::application::handlers::billing::BillingAssignmentReconciler;
    use crate::domain::foundation::ProgramCode;

    fn mahad() -> ProgramCode {
        ProgramCode::new("MAHAD").unwrap()
    }

    struct Fixture {
        enrollment: Arc<InMemoryEnrollmentStore>,
        billing: Arc<InMemoryBillingStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                enrollment: Arc::new(InMemoryEnrollmentStore::new()),
                billing: Arc::new(InMemoryBillingStore::new()),
            }
        }

        fn matcher(&self) -> ProfileMatcher {
            ProfileMatcher::new(
                PersonLookup::new(self.enrollment.clone()),
                self.billing.clone(),
            )
        }

        async fn student(
            &self,
            name: &str,
            email: Option<&str>,
            phone: Option<&str>,
        ) -> ProgramProfile {
            let person = Person::new(name);
            self.enrollment.add_person(person.clone()).await;
            if let Some(email) = email.and_then(NormalizedEmail::parse) {
                self.enrollment
                    .add_contact(ContactPoint::email(person.id, &email, true))
                    .await;
            }
            if let Some(phone) = phone.and_then(NormalizedPhone::parse) {
                self.enrollment
                    .add_contact(ContactPoint::phone(person.id, &phone, false))
                    .await;
            }
            let profile = ProgramProfile::register(person.id, mahad());
            self.enrollment.add_profile(profile.clone()).await;
            profile
        }

        async fn link(&self, profile: &ProgramProfile, subscription: &str) {
            BillingAssignmentReconciler::new(self.billing.clone())
                .reconcile(
                    &SubscriptionLink::new(subscription),
                    &[AssignmentRequest::new(profile.id, Cents::new(12_000))],
                )
                .await
                .unwrap();
        }
    }

    fn event() -> PaymentEvent {
        PaymentEvent::new("evt_1", mahad())
    }

    #[tokio::test]
    async fn student_email_beats_payer_email() {
        let fx = Fixture::new();
        let student = fx.student("Yusuf", Some("yusuf@example.com"), None).await;
        fx.student("Parent-linked", Some("parent@example.com"), None).await;

        let outcome = fx
            .matcher()
            .match_payment(
                &event()
                    .with_student_email("YUSUF@example.com")
                    .with_payer_email("parent@example.com"),
            )
            .await
            .unwrap();

        match outcome {
            MatchOutcome::Matched { profile, method, .. } => {
                assert_eq!(profile.id, student.id);
                assert_eq!(method, MatchMethod::StudentEmail);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ambiguous_strategy_falls_through_to_next() {
        let fx = Fixture::new();
        let a = fx
            .student("Sibling A", Some("family@example.com"), Some("612-555-0101"))
            .await;
        fx.student("Sibling B", Some("family@example.com"), None).await;

        let outcome = fx
            .matcher()
            .match_payment(
                &event()
                    .with_student_email("family@example.com")
                    .with_student_phone("(612) 555 0101"),
            )
            .await
            .unwrap();

        let MatchOutcome::Matched { profile, method, attempts } = outcome else {
            panic!("expected match");
        };
        assert_eq!(profile.id, a.id);
        assert_eq!(method, MatchMethod::StudentPhone);
        assert!(matches!(
            &attempts[0].result,
            AttemptResult::Ambiguous { candidates } if candidates.len() == 2
        ));
    }

    #[tokio::test]
    async fn ambiguity_alone_never_matches() {
        let fx = Fixture::new();
        fx.student("Sibling A", None, Some("6125550101")).await;
        fx.student("Sibling B", None, Some("612.555.0101")).await;

        let outcome = fx
            .matcher()
            .match_payment(&event().with_student_phone("6125550101"))
            .await
            .unwrap();

        assert!(!outcome.is_matched());
        assert_eq!(outcome.attempts().len(), 3);
    }

    #[tokio::test]
    async fn linked_sibling_is_excluded_from_candidates() {
        let fx = Fixture::new();
        let a = fx.student("Sibling A", None, Some("6125550101")).await;
        let b = fx.student("Sibling B", None, Some("6125550101")).await;
        fx.link(&b, "sub_existing").await;

        let outcome = fx
            .matcher()
            .match_payment(&event().with_student_phone("612-555-0101"))
            .await
            .unwrap();

        assert_eq!(outcome.matched_profile().map(|p| p.id), Some(a.id));
    }

    #[tokio::test]
    async fn profile_funded_by_the_same_subscription_is_matched_again() {
        let fx = Fixture::new();
        let a = fx.student("Sibling A", Some("a@example.com"), None).await;
        fx.student("Sibling B", Some("parent@example.com"), None).await;
        fx.link(&a, "sub_1").await;
        let redelivered = event()
            .with_student_email("a@example.com")
            .with_payer_email("parent@example.com")
            .with_subscription("sub_1");

        let outcome = fx.matcher().match_payment(&redelivered).await.unwrap();

        let MatchOutcome::Matched { profile, method, attempts } = outcome else {
            panic!("expected match");
        };
        assert_eq!(profile.id, a.id);
        assert_eq!(method, MatchMethod::StudentEmail);
        assert_eq!(
            attempts[0].result,
            AttemptResult::AlreadyFunded { profile_id: a.id }
        );
    }

    #[tokio::test]
    async fn profile_funded_by_another_subscription_is_still_excluded() {
        let fx = Fixture::new();
        let a = fx.student("Sibling A", Some("a@example.com"), None).await;
        let b = fx.student("Sibling B", Some("parent@example.com"), None).await;
        fx.link(&a, "sub_other").await;

        let outcome = fx
            .matcher()
            .match_payment(
                &event()
                    .with_student_email("a@example.com")
                    .with_payer_email("parent@example.com")
                    .with_subscription("sub_new"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.matched_profile().map(|p| p.id), Some(b.id));
    }

    #[tokio::test]
    async fn invalid_identifiers_are_skipped() {
        let fx = Fixture::new();
        let student = fx.student("Parent", Some("parent@example.com"), None).await;

        let outcome = fx
            .matcher()
            .match_payment(
                &event()
                    .with_student_email("   ")
                    .with_student_phone("123")
                    .with_payer_email("Parent@Example.com "),
            )
            .await
            .unwrap();

        let MatchOutcome::Matched { profile, method, attempts } = outcome else {
            panic!("expected match");
        };
        assert_eq!(profile.id, student.id);
        assert_eq!(method, MatchMethod::PayerEmail);
        assert_eq!(attempts[0].result, AttemptResult::Skipped);
        assert_eq!(attempts[1].result, AttemptResult::Skipped);
    }

    #[tokio::test]
    async fn no_match_reports_every_attempt() {
        let fx = Fixture::new();

        let outcome = fx
            .matcher()
            .match_payment(
                &event()
                    .with_student_email("ghost@example.com")
                    .with_payer_email("payer@example.com"),
            )
            .await
            .unwrap();

        let MatchOutcome::ManualReview { attempts, retained_email } = outcome else {
            panic!("expected manual review");
        };
        let methods: Vec<_> = attempts.iter().map(|a| a.method).collect();
        assert_eq!(
            methods,
            vec![
                MatchMethod::StudentEmail,
                MatchMethod::StudentPhone,
                MatchMethod::PayerEmail
            ]
        );
        assert_eq!(attempts[0].result, AttemptResult::NoPerson);
        assert!(retained_email.is_none());
    }

    #[tokio::test]
    async fn payer_known_without_profile_retains_email() {
        let fx = Fixture::new();
        let parent = Person::new("Parent");
        let email = NormalizedEmail::parse("parent@example.com").unwrap();
        fx.enrollment.add_person(parent.clone()).await;
        fx.enrollment
            .add_contact(ContactPoint::email(parent.id, &email, true))
            .await;

        let outcome = fx
            .matcher()
            .match_payment(&event().with_payer_email("PARENT@example.com"))
            .await
            .unwrap();

        let MatchOutcome::ManualReview { retained_email, .. } = outcome else {
            panic!("expected manual review");
        };
        assert_eq!(retained_email, Some(email));
    }
}
