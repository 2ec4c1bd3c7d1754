//! Match outcomes and pure candidate resolution.

use serde::Serialize;
use std::collections::HashSet;

use super::MatchMethod;
use crate::domain::contact::NormalizedEmail;
use crate::domain::enrollment::ProgramProfile;
use crate::domain::foundation::{PersonId, ProgramProfileId};

/// Result of filtering one strategy's profiles down to unlinked candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// The payment's own subscription already funds this profile.
    AlreadyFunded(ProgramProfile),
    /// Exactly one unlinked profile.
    Unique(ProgramProfile),
    /// Every profile is already billed, or there were none.
    None,
    /// More than one unlinked profile; ids are sorted.
    Ambiguous(Vec<ProgramProfileId>),
}

/// Classifies one strategy's profiles.
///
/// A profile in `funded` wins outright: it is paid for by the subscription
/// of the payment being matched, so the event was applied before. Other
/// profiles with an active assignment in `linked` are dropped.
pub fn resolve_candidates(
    profiles: Vec<ProgramProfile>,
    linked: &HashSet<ProgramProfileId>,
    funded: &HashSet<ProgramProfileId>,
) -> Candidates {
    let mut profiles = profiles;
    // A person reached through two contact points yields the same profile twice.
    profiles.sort_by_key(|p| p.id);
    profiles.dedup_by_key(|p| p.id);

    if let Some(index) = profiles.iter().position(|p| funded.contains(&p.id)) {
        return Candidates::AlreadyFunded(profiles.swap_remove(index));
    }

    let mut unlinked: Vec<ProgramProfile> = profiles
        .into_iter()
        .filter(|p| !linked.contains(&p.id))
        .collect();

    match unlinked.len() {
        0 => Candidates::None,
        1 => match unlinked.pop() {
            Some(profile) => Candidates::Unique(profile),
            None => Candidates::None,
        },
        _ => Candidates::Ambiguous(unlinked.into_iter().map(|p| p.id).collect()),
    }
}

/// What one strategy found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    /// The field was absent or did not normalize.
    Skipped,
    /// Nobody owns the contact.
    NoPerson,
    /// Persons were found but none had an unlinked profile in the program.
    NoUnlinkedProfile {
        persons: Vec<PersonId>,
        profiles_in_program: usize,
    },
    /// Several unlinked profiles matched.
    Ambiguous { candidates: Vec<ProgramProfileId> },
    /// A single unlinked profile matched.
    Matched { profile_id: ProgramProfileId },
    /// The payment's subscription already funds this profile.
    AlreadyFunded { profile_id: ProgramProfileId },
}

/// Record of one strategy run, kept for logging and manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchAttempt {
    pub method: MatchMethod,
    /// Raw field value from the event, if present.
    pub identifier: Option<String>,
    /// Normalized value actually looked up.
    pub normalized: Option<String>,
    #[serde(flatten)]
    pub result: AttemptResult,
}

impl MatchAttempt {
    pub fn skipped(method: MatchMethod, identifier: Option<&str>) -> Self {
        Self {
            method,
            identifier: identifier.map(str::to_string),
            normalized: None,
            result: AttemptResult::Skipped,
        }
    }

    /// Returns true if persons were found for the contact but none of them
    /// has any profile in the target program.
    pub fn found_person_without_profile(&self) -> bool {
        matches!(
            &self.result,
            AttemptResult::NoUnlinkedProfile {
                profiles_in_program: 0,
                ..
            }
        )
    }
}

/// Final answer of the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched {
        profile: ProgramProfile,
        method: MatchMethod,
        attempts: Vec<MatchAttempt>,
    },
    ManualReview {
        attempts: Vec<MatchAttempt>,
        /// Validated payer email kept when it belongs to a known person who
        /// is not yet enrolled in the program.
        retained_email: Option<NormalizedEmail>,
    },
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    pub fn attempts(&self) -> &[MatchAttempt] {
        match self {
            MatchOutcome::Matched { attempts, .. } | MatchOutcome::ManualReview { attempts, .. } => {
                attempts
            }
        }
    }

    pub fn matched_profile(&self) -> Option<&ProgramProfile> {
        match self {
            MatchOutcome::Matched { profile, .. } => Some(profile),
            MatchOutcome::ManualReview { .. } => None,
        }
    }
}
