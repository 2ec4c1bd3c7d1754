//! Program enrollment records and their billing-relevant attributes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PersonId, ProgramCode, ProgramProfileId, Timestamp};

/// Enrollment lifecycle of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Registered,
    Enrolled,
    OnLeave,
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Registered => "registered",
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::OnLeave => "on_leave",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "registered" => Some(EnrollmentStatus::Registered),
            "enrolled" => Some(EnrollmentStatus::Enrolled),
            "on_leave" => Some(EnrollmentStatus::OnLeave),
            "withdrawn" => Some(EnrollmentStatus::Withdrawn),
            _ => None,
        }
    }
}

/// Graduation tier used for tuition pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraduationStatus {
    NonGraduate,
    Graduate,
}

impl GraduationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraduationStatus::NonGraduate => "NON_GRADUATE",
            GraduationStatus::Graduate => "GRADUATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NON_GRADUATE" => Some(GraduationStatus::NonGraduate),
            "GRADUATE" => Some(GraduationStatus::Graduate),
            _ => None,
        }
    }
}

/// How often a family is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    Monthly,
    BiMonthly,
}

impl PaymentFrequency {
    /// Number of months one billing cycle covers.
    pub fn months_per_cycle(&self) -> i64 {
        match self {
            PaymentFrequency::Monthly => 1,
            PaymentFrequency::BiMonthly => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "MONTHLY",
            PaymentFrequency::BiMonthly => "BI_MONTHLY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONTHLY" => Some(PaymentFrequency::Monthly),
            "BI_MONTHLY" => Some(PaymentFrequency::BiMonthly),
            _ => None,
        }
    }
}

/// Billing arrangement of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    FullTime,
    FullTimeScholarship,
    PartTime,
    Exempt,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::FullTime => "FULL_TIME",
            BillingType::FullTimeScholarship => "FULL_TIME_SCHOLARSHIP",
            BillingType::PartTime => "PART_TIME",
            BillingType::Exempt => "EXEMPT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FULL_TIME" => Some(BillingType::FullTime),
            "FULL_TIME_SCHOLARSHIP" => Some(BillingType::FullTimeScholarship),
            "PART_TIME" => Some(BillingType::PartTime),
            "EXEMPT" => Some(BillingType::Exempt),
            _ => None,
        }
    }
}

/// Enrollment of one person in one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramProfile {
    pub id: ProgramProfileId,
    pub person_id: PersonId,
    pub program: ProgramCode,
    pub status: EnrollmentStatus,
    pub graduation_status: Option<GraduationStatus>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub billing_type: Option<BillingType>,
    /// Groups siblings that may share one family subscription.
    pub family_reference_id: Option<String>,
    pub created_at: Timestamp,
}

impl ProgramProfile {
    /// Creates a freshly registered profile with no billing attributes yet.
    pub fn register(person_id: PersonId, program: ProgramCode) -> Self {
        Self {
            id: ProgramProfileId::new(),
            person_id,
            program,
            status: EnrollmentStatus::Registered,
            graduation_status: None,
            payment_frequency: None,
            billing_type: None,
            family_reference_id: None,
            created_at: Timestamp::now(),
        }
    }

    /// Sets the billing attributes used for rate calculation.
    pub fn with_billing(
        mut self,
        graduation_status: Option<GraduationStatus>,
        payment_frequency: Option<PaymentFrequency>,
        billing_type: Option<BillingType>,
    ) -> Self {
        self.graduation_status = graduation_status;
        self.payment_frequency = payment_frequency;
        self.billing_type = billing_type;
        self
    }

    /// Places the profile in a sibling group.
    pub fn with_family(mut self, family_reference_id: impl Into<String>) -> Self {
        self.family_reference_id = Some(family_reference_id.into());
        self
    }

    pub fn is_in_program(&self, program: &ProgramCode) -> bool {
        &self.program == program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_strings_roundtrip() {
        for status in [
            EnrollmentStatus::Registered,
            EnrollmentStatus::Enrolled,
            EnrollmentStatus::OnLeave,
            EnrollmentStatus::Withdrawn,
        ] {
            assert_eq!(EnrollmentStatus::parse(status.as_str()), Some(status));
        }
        for billing in [
            BillingType::FullTime,
            BillingType::FullTimeScholarship,
            BillingType::PartTime,
            BillingType::Exempt,
        ] {
            assert_eq!(BillingType::parse(billing.as_str()), Some(billing));
        }
        assert_eq!(PaymentFrequency::parse("bi_monthly"), Some(PaymentFrequency::BiMonthly));
        assert_eq!(GraduationStatus::parse("graduate"), Some(GraduationStatus::Graduate));
    }

    #[test]
    fn unknown_enum_strings_are_rejected() {
        assert!(BillingType::parse("HALF_TIME").is_none());
        assert!(EnrollmentStatus::parse("").is_none());
    }

    #[test]
    fn billing_type_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&BillingType::FullTimeScholarship).unwrap();
        assert_eq!(json, "\"FULL_TIME_SCHOLARSHIP\"");
    }

    #[test]
    fn bi_monthly_cycle_covers_two_months() {
        assert_eq!(PaymentFrequency::BiMonthly.months_per_cycle(), 2);
        assert_eq!(PaymentFrequency::Monthly.months_per_cycle(), 1);
    }

    #[test]
    fn registered_profile_has_no_billing_attributes() {
        let profile = ProgramProfile::register(PersonId::new(), ProgramCode::new("MAHAD").unwrap());

        assert_eq!(profile.status, EnrollmentStatus::Registered);
        assert!(profile.billing_type.is_none());
        assert!(profile.family_reference_id.is_none());
    }
}
