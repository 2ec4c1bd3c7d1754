//! Billing reconciliation error types.
//!
//! Matching failures are not errors; they surface as a manual-review
//! outcome. Only malformed reconcile requests, lost write races and
//! infrastructure failures end up here.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ProgramProfileId};

/// Errors raised while writing billing assignments.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// Reconcile was called without any profile to attach.
    #[error("No profiles to reconcile")]
    EmptyRequest,

    /// The same profile appeared twice in one reconcile request.
    #[error("Profile {0} listed more than once")]
    DuplicateProfile(ProgramProfileId),

    /// The subscription was canceled before this payment was applied.
    #[error("Subscription {0} has ended")]
    SubscriptionEnded(String),

    /// A concurrent writer changed the profiles first and the desired state
    /// was not reached.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Storage failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(DomainError),
}

impl BillingError {
    /// Returns true if the webhook should be redelivered.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::ConcurrentModification(_) | BillingError::Infrastructure(_)
        )
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::EmptyRequest
            | BillingError::DuplicateProfile(_)
            | BillingError::SubscriptionEnded(_) => ErrorCode::ValidationFailed,
            BillingError::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            BillingError::Infrastructure(err) => err.code,
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        if err.is_concurrent_modification() {
            BillingError::ConcurrentModification(err.message)
        } else {
            BillingError::Infrastructure(err)
        }
    }
}
