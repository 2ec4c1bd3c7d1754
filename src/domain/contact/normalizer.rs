//! Canonical forms for email addresses and phone numbers.
//!
//! Normalization is total: malformed input yields `None`, never an error,
//! so callers can treat "invalid" and "absent" the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum digit count for a phone number to be considered usable.
pub const MIN_PHONE_DIGITS: usize = 7;

/// A trimmed, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    /// Normalizes a raw email string.
    ///
    /// Returns `None` for blank input or input without an `@`.
    pub fn parse(raw: &str) -> Option<Self> {
        let email = raw.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return None;
        }
        Some(Self(email))
    }

    /// Wraps a value already stored in normalized form.
    pub fn from_normalized(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A phone number reduced to its digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Normalizes a raw phone string by dropping every non-digit character.
    ///
    /// Returns `None` when fewer than [`MIN_PHONE_DIGITS`] digits remain.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_PHONE_DIGITS {
            return None;
        }
        Some(Self(digits))
    }

    /// Wraps a value already stored in normalized form.
    pub fn from_normalized(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes an email address. See [`NormalizedEmail::parse`].
pub fn normalize_email(raw: &str) -> Option<NormalizedEmail> {
    NormalizedEmail::parse(raw)
}

/// Normalizes a phone number. See [`NormalizedPhone::parse`].
pub fn normalize_phone(raw: &str) -> Option<NormalizedPhone> {
    NormalizedPhone::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Email
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = normalize_email("  Parent.Name@Example.COM \n").unwrap();
        assert_eq!(email.as_str(), "parent.name@example.com");
    }

    #[test]
    fn differently_cased_emails_compare_equal() {
        assert_eq!(
            normalize_email("AMINA@school.org"),
            normalize_email("amina@SCHOOL.org ")
        );
    }

    #[test]
    fn blank_email_is_rejected() {
        assert!(normalize_email("").is_none());
        assert!(normalize_email("   ").is_none());
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        assert!(normalize_email("not-an-email").is_none());
    }

    // ══════════════════════════════════════════════════════════════
    // Phone
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn phone_keeps_only_digits() {
        let phone = normalize_phone("+1 (612) 555-0199").unwrap();
        assert_eq!(phone.as_str(), "16125550199");
    }

    #[test]
    fn differently_formatted_phones_compare_equal() {
        assert_eq!(
            normalize_phone("612.555.0199"),
            normalize_phone("(612) 555 0199")
        );
    }

    #[test]
    fn phone_with_exactly_seven_digits_is_accepted() {
        assert_eq!(normalize_phone("555-0199").unwrap().as_str(), "5550199");
    }

    #[test]
    fn phone_with_fewer_than_seven_digits_is_rejected() {
        assert!(normalize_phone("555-019").is_none());
        assert!(normalize_phone("call me").is_none());
        assert!(normalize_phone("").is_none());
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        // Arabic-Indic digits are not ASCII digits and must not count.
        assert!(normalize_phone("٠١٢٣٤٥٦٧٨").is_none());
    }
}
