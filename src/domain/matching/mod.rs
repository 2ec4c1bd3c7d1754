//! Profile matching domain module.
//!
//! Pure parts of the payment-to-enrollment matcher: the event shape, the
//! ordered strategies and candidate resolution. The matcher that drives
//! lookups lives in the application layer.

mod event;
mod outcome;
mod review;
mod strategy;

pub use event::PaymentEvent;
pub use outcome::{resolve_candidates, AttemptResult, Candidates, MatchAttempt, MatchOutcome};
pub use review::{ManualReviewItem, ManualReviewReason};
pub use strategy::{ContactExtractor, MatchMethod, MatchStrategy};
