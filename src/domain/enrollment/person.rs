//! Person and contact point records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::contact::{NormalizedEmail, NormalizedPhone};
use crate::domain::foundation::{ContactPointId, PersonId};

/// Canonical identity of one human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl Person {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: PersonId::new(),
            display_name: display_name.into(),
            date_of_birth: None,
        }
    }
}

/// Kind of contact channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Email,
    Phone,
    Whatsapp,
}

impl ContactKind {
    /// Returns true for channels addressed by a phone number.
    pub fn is_phone_like(&self) -> bool {
        matches!(self, ContactKind::Phone | ContactKind::Whatsapp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Email => "email",
            ContactKind::Phone => "phone",
            ContactKind::Whatsapp => "whatsapp",
        }
    }
}

/// Whether a contact point has been confirmed by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Verified,
}

/// A normalized email or phone owned by exactly one person.
///
/// The same normalized value may appear on several people (a household
/// phone shared by siblings), so it is never used as a unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub id: ContactPointId,
    pub person_id: PersonId,
    pub kind: ContactKind,
    pub value: String,
    pub is_primary: bool,
    pub verification: VerificationStatus,
}

impl ContactPoint {
    /// Email contact point.
    pub fn email(person_id: PersonId, email: &NormalizedEmail, is_primary: bool) -> Self {
        Self {
            id: ContactPointId::new(),
            person_id,
            kind: ContactKind::Email,
            value: email.as_str().to_string(),
            is_primary,
            verification: VerificationStatus::Unverified,
        }
    }

    /// Phone contact point.
    pub fn phone(person_id: PersonId, phone: &NormalizedPhone, is_primary: bool) -> Self {
        Self {
            id: ContactPointId::new(),
            person_id,
            kind: ContactKind::Phone,
            value: phone.as_str().to_string(),
            is_primary,
            verification: VerificationStatus::Unverified,
        }
    }

    /// Returns true if this contact point is matched by the given email.
    pub fn matches_email(&self, email: &NormalizedEmail) -> bool {
        self.kind == ContactKind::Email && self.value == email.as_str()
    }

    /// Returns true if this contact point is matched by the given phone.
    pub fn matches_phone(&self, phone: &NormalizedPhone) -> bool {
        self.kind.is_phone_like() && self.value == phone.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_contact_matches_phone_query() {
        let person = PersonId::new();
        let phone = NormalizedPhone::parse("612-555-0199").unwrap();
        let mut contact = ContactPoint::phone(person, &phone, true);
        contact.kind = ContactKind::Whatsapp;

        assert!(contact.matches_phone(&phone));
    }

    #[test]
    fn email_contact_never_matches_phone_query() {
        let person = PersonId::new();
        let email = NormalizedEmail::parse("6125550199@sms.example").unwrap();
        let contact = ContactPoint::email(person, &email, true);
        let phone = NormalizedPhone::parse("6125550199").unwrap();

        assert!(!contact.matches_phone(&phone));
        assert!(contact.matches_email(&email));
    }
}
