//! Match strategies in priority order.
//!
//! A strategy only decides which contact to look up; the matcher does the
//! lookup and candidate filtering the same way for every strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PaymentEvent;
use crate::domain::contact::{ContactQuery, NormalizedEmail, NormalizedPhone};

/// How a profile was (or was attempted to be) identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Student email custom field. Highest trust.
    StudentEmail,
    /// Student phone custom field.
    StudentPhone,
    /// Email of the paying account. Lowest trust; often shared by siblings.
    PayerEmail,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::StudentEmail => "student_email",
            MatchMethod::StudentPhone => "student_phone",
            MatchMethod::PayerEmail => "payer_email",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts a normalized contact from an event, or `None` if the field is
/// missing or invalid.
pub type ContactExtractor = fn(&PaymentEvent) -> Option<ContactQuery>;

/// One step of the matching cascade.
#[derive(Clone, Copy)]
pub struct MatchStrategy {
    pub method: MatchMethod,
    pub extract: ContactExtractor,
}

impl MatchStrategy {
    /// The cascade used for every payment: student email, student phone,
    /// then payer email.
    pub fn default_order() -> Vec<MatchStrategy> {
        vec![
            MatchStrategy {
                method: MatchMethod::StudentEmail,
                extract: student_email_contact,
            },
            MatchStrategy {
                method: MatchMethod::StudentPhone,
                extract: student_phone_contact,
            },
            MatchStrategy {
                method: MatchMethod::PayerEmail,
                extract: payer_email_contact,
            },
        ]
    }

    /// Raw value of the field this strategy reads.
    pub fn raw_identifier<'a>(&self, event: &'a PaymentEvent) -> Option<&'a str> {
        match self.method {
            MatchMethod::StudentEmail => event.student_email.as_deref(),
            MatchMethod::StudentPhone => event.student_phone.as_deref(),
            MatchMethod::PayerEmail => event.payer_email.as_deref(),
        }
    }
}

impl fmt::Debug for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchStrategy")
            .field("method", &self.method)
            .finish()
    }
}

fn student_email_contact(event: &PaymentEvent) -> Option<ContactQuery> {
    event
        .student_email
        .as_deref()
        .and_then(NormalizedEmail::parse)
        .map(ContactQuery::by_email)
}

fn student_phone_contact(event: &PaymentEvent) -> Option<ContactQuery> {
    event
        .student_phone
        .as_deref()
        .and_then(NormalizedPhone::parse)
        .map(ContactQuery::by_phone)
}

fn payer_email_contact(event: &PaymentEvent) -> Option<ContactQuery> {
    event
        .payer_email
        .as_deref()
        .and_then(NormalizedEmail::parse)
        .map(ContactQuery::by_email)
}
