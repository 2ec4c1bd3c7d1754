//! Tuition rate calculation.
//!
//! Rates are integer cents. Base rates are monthly-equivalent per tier and
//! frequency; bi-monthly bases are discounted independently rather than
//! derived from the monthly ones.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::enrollment::{BillingType, GraduationStatus, PaymentFrequency};

/// An amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

/// Monthly-equivalent base rates and the scholarship discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub non_graduate_monthly: i64,
    pub non_graduate_bi_monthly: i64,
    pub graduate_monthly: i64,
    pub graduate_bi_monthly: i64,
    pub scholarship_discount: i64,
}

impl RateTable {
    /// The contracted tuition schedule.
    pub const STANDARD: RateTable = RateTable {
        non_graduate_monthly: 12_000,
        non_graduate_bi_monthly: 11_000,
        graduate_monthly: 9_500,
        graduate_bi_monthly: 9_000,
        scholarship_discount: 3_000,
    };

    /// Largest entry a configured table may hold (one million dollars).
    pub const MAX_ENTRY_CENTS: i64 = 100_000_000;

    /// Monthly-equivalent base rate for a tier and frequency.
    pub fn base_rate(&self, graduation: GraduationStatus, frequency: PaymentFrequency) -> i64 {
        match (graduation, frequency) {
            (GraduationStatus::NonGraduate, PaymentFrequency::Monthly) => self.non_graduate_monthly,
            (GraduationStatus::NonGraduate, PaymentFrequency::BiMonthly) => {
                self.non_graduate_bi_monthly
            }
            (GraduationStatus::Graduate, PaymentFrequency::Monthly) => self.graduate_monthly,
            (GraduationStatus::Graduate, PaymentFrequency::BiMonthly) => self.graduate_bi_monthly,
        }
    }

    /// Amount charged per billing cycle.
    ///
    /// Exempt and not-yet-billable (`None`) enrollments cost nothing. Missing
    /// tier defaults to non-graduate, missing frequency to monthly. Part-time
    /// halves with floor division; the result is never rounded up.
    pub fn rate(
        &self,
        graduation: Option<GraduationStatus>,
        frequency: Option<PaymentFrequency>,
        billing_type: Option<BillingType>,
    ) -> Cents {
        let billing_type = match billing_type {
            None | Some(BillingType::Exempt) => return Cents::ZERO,
            Some(billing_type) => billing_type,
        };

        let graduation = graduation.unwrap_or(GraduationStatus::NonGraduate);
        let frequency = frequency.unwrap_or(PaymentFrequency::Monthly);
        let base = self.base_rate(graduation, frequency);

        let monthly = match billing_type {
            BillingType::PartTime => base.div_euclid(2),
            BillingType::FullTimeScholarship => {
                base.saturating_sub(self.scholarship_discount).max(0)
            }
            BillingType::FullTime | BillingType::Exempt => base,
        };

        Cents(monthly.saturating_mul(frequency.months_per_cycle()))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Tuition per billing cycle under the standard schedule.
pub fn calculate_rate(
    graduation: Option<GraduationStatus>,
    frequency: Option<PaymentFrequency>,
    billing_type: Option<BillingType>,
) -> Cents {
    RateTable::STANDARD.rate(graduation, frequency, billing_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use BillingType::*;
    use GraduationStatus::*;
    use PaymentFrequency::*;

    // ══════════════════════════════════════════════════════════════
    // Contract examples
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn oversized_table_saturates_instead_of_overflowing() {
        let table = RateTable {
            non_graduate_bi_monthly: i64::MAX,
            ..RateTable::STANDARD
        };
        assert_eq!(
            table.rate(Some(NonGraduate), Some(BiMonthly), Some(FullTime)),
            Cents::new(i64::MAX)
        );

        let table = RateTable {
            non_graduate_monthly: i64::MIN,
            scholarship_discount: i64::MAX,
            ..RateTable::STANDARD
        };
        assert_eq!(
            table.rate(Some(NonGraduate), Some(Monthly), Some(FullTimeScholarship)),
            Cents::ZERO
        );
    }

    #[test]
    fn non_graduate_monthly_full_time() {
        assert_eq!(
            calculate_rate(Some(NonGraduate), Some(Monthly), Some(FullTime)),
            Cents::new(12_000)
        );
    }

    #[test]
    fn non_graduate_monthly_scholarship() {
        assert_eq!(
            calculate_rate(Some(NonGraduate), Some(Monthly), Some(FullTimeScholarship)),
            Cents::new(9_000)
        );
    }

    #[test]
    fn non_graduate_monthly_part_time() {
        assert_eq!(
            calculate_rate(Some(NonGraduate), Some(Monthly), Some(PartTime)),
            Cents::new(6_000)
        );
    }

    #[test]
    fn non_graduate_bi_monthly_full_time_covers_two_months() {
        assert_eq!(
            calculate_rate(Some(NonGraduate), Some(BiMonthly), Some(FullTime)),
            Cents::new(22_000)
        );
    }

    #[test]
    fn bi_monthly_is_not_double_the_monthly_rate() {
        let monthly = calculate_rate(Some(Graduate), Some(Monthly), Some(FullTime));
        let bi_monthly = calculate_rate(Some(Graduate), Some(BiMonthly), Some(FullTime));
        assert!(bi_monthly.value() < monthly.value() * 2);
    }

    #[test]
    fn graduate_bi_monthly_part_time_halves_then_doubles() {
        // 9000 / 2 = 4500 per month, two months per cycle
        assert_eq!(
            calculate_rate(Some(Graduate), Some(BiMonthly), Some(PartTime)),
            Cents::new(9_000)
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Defaults and zero rates
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn exempt_is_free() {
        assert_eq!(calculate_rate(Some(Graduate), Some(BiMonthly), Some(Exempt)), Cents::ZERO);
    }

    #[test]
    fn missing_billing_type_is_not_billable() {
        assert_eq!(calculate_rate(Some(NonGraduate), Some(Monthly), None), Cents::ZERO);
    }

    #[test]
    fn missing_tier_and_frequency_default_to_non_graduate_monthly() {
        assert_eq!(calculate_rate(None, None, Some(FullTime)), Cents::new(12_000));
    }

    #[test]
    fn scholarship_never_goes_negative() {
        let table = RateTable {
            scholarship_discount: 50_000,
            ..RateTable::STANDARD
        };
        assert_eq!(table.rate(None, None, Some(FullTimeScholarship)), Cents::ZERO);
    }

    // ══════════════════════════════════════════════════════════════
    // Floor division
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn part_time_floors_odd_base_rate() {
        let table = RateTable {
            non_graduate_monthly: 12_001,
            non_graduate_bi_monthly: 10_999,
            ..RateTable::STANDARD
        };

        assert_eq!(table.rate(None, Some(Monthly), Some(PartTime)), Cents::new(6_000));
        // floor(10999 / 2) = 5499, then two months
        assert_eq!(table.rate(None, Some(BiMonthly), Some(PartTime)), Cents::new(10_998));
    }

    #[test]
    fn cents_display_as_currency() {
        assert_eq!(Cents::new(12_000).to_string(), "120.00");
        assert_eq!(Cents::new(5_499).to_string(), "54.99");
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    fn graduation() -> impl Strategy<Value = Option<GraduationStatus>> {
        prop_oneof![Just(None), Just(Some(NonGraduate)), Just(Some(Graduate))]
    }

    fn frequency() -> impl Strategy<Value = Option<PaymentFrequency>> {
        prop_oneof![Just(None), Just(Some(Monthly)), Just(Some(BiMonthly))]
    }

    fn billing() -> impl Strategy<Value = Option<BillingType>> {
        prop_oneof![
            Just(None),
            Just(Some(FullTime)),
            Just(Some(FullTimeScholarship)),
            Just(Some(PartTime)),
            Just(Some(Exempt)),
        ]
    }

    proptest! {
        #[test]
        fn rate_is_deterministic(g in graduation(), f in frequency(), b in billing()) {
            prop_assert_eq!(calculate_rate(g, f, b), calculate_rate(g, f, b));
        }

        #[test]
        fn exempt_and_unset_are_always_zero(g in graduation(), f in frequency()) {
            prop_assert_eq!(calculate_rate(g, f, Some(Exempt)), Cents::ZERO);
            prop_assert_eq!(calculate_rate(g, f, None), Cents::ZERO);
        }

        #[test]
        fn part_time_is_floor_of_half(base in 0i64..1_000_000, bi in any::<bool>()) {
            let table = RateTable {
                non_graduate_monthly: base,
                non_graduate_bi_monthly: base,
                ..RateTable::STANDARD
            };
            let frequency = if bi { BiMonthly } else { Monthly };
            let rate = table.rate(None, Some(frequency), Some(PartTime));
            prop_assert_eq!(rate.value(), (base / 2) * frequency.months_per_cycle());
        }
    }
}
