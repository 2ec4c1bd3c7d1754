//! Strongly-typed identifier value objects.
//!
//! Every billing row references its neighbours through these ids rather than
//! through in-memory references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Declares a UUID-backed identifier with the usual constructors and
/// `Display`/`FromStr` impls.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_identifier!(
    /// Canonical identity of one human.
    PersonId
);

uuid_identifier!(
    /// Identifier of an email/phone contact point owned by a person.
    ContactPointId
);

uuid_identifier!(
    /// Identifier of one person's enrollment in one program.
    ProgramProfileId
);

uuid_identifier!(
    /// Identifier of a locally stored subscription record.
    SubscriptionId
);

uuid_identifier!(
    /// Identifier of a profile-to-subscription billing link.
    BillingAssignmentId
);

uuid_identifier!(
    /// Identifier of a payment event parked for manual review.
    ReviewItemId
);

/// Code of a program a person can enroll in (e.g. `MAHAD`, `WEEKEND_SCHOOL`).
///
/// Codes are compared case-insensitively by storing them uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramCode(String);

impl ProgramCode {
    /// Creates a program code, returning error if blank.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("program"));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(PersonId::new(), PersonId::new());
        assert_ne!(ProgramProfileId::new(), ProgramProfileId::new());
    }

    #[test]
    fn id_parses_from_display_output() {
        let id = BillingAssignmentId::new();
        let parsed: BillingAssignmentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn id_rejects_garbage() {
        assert!("not-a-uuid".parse::<SubscriptionId>().is_err());
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&PersonId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn program_code_is_trimmed_and_uppercased() {
        let code = ProgramCode::new("  mahad ").unwrap();
        assert_eq!(code.as_str(), "MAHAD");
        assert_eq!(code, ProgramCode::new("MAHAD").unwrap());
    }

    #[test]
    fn program_code_rejects_blank() {
        assert!(ProgramCode::new("   ").is_err());
        assert!(ProgramCode::new("").is_err());
    }
}
