//! Billing configuration: default program and tuition rate overrides

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::billing::RateTable;
use crate::domain::foundation::ProgramCode;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Program assumed when a checkout carries no `program` metadata
    #[serde(default = "default_program")]
    pub default_program: String,

    /// Per-entry overrides of the standard rate table, in cents
    #[serde(default)]
    pub rates: RateOverrides,
}

/// Unset entries keep the standard schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateOverrides {
    pub non_graduate_monthly: Option<i64>,
    pub non_graduate_bi_monthly: Option<i64>,
    pub graduate_monthly: Option<i64>,
    pub graduate_bi_monthly: Option<i64>,
    pub scholarship_discount: Option<i64>,
}

impl BillingConfig {
    pub fn program_code(&self) -> Result<ProgramCode, ValidationError> {
        ProgramCode::new(self.default_program.as_str())
            .map_err(|_| ValidationError::InvalidProgramCode)
    }

    /// Standard schedule with configured overrides applied.
    pub fn rate_table(&self) -> RateTable {
        let standard = RateTable::STANDARD;
        let r = &self.rates;
        RateTable {
            non_graduate_monthly: r
                .non_graduate_monthly
                .unwrap_or(standard.non_graduate_monthly),
            non_graduate_bi_monthly: r
                .non_graduate_bi_monthly
                .unwrap_or(standard.non_graduate_bi_monthly),
            graduate_monthly: r.graduate_monthly.unwrap_or(standard.graduate_monthly),
            graduate_bi_monthly: r
                .graduate_bi_monthly
                .unwrap_or(standard.graduate_bi_monthly),
            scholarship_discount: r
                .scholarship_discount
                .unwrap_or(standard.scholarship_discount),
        }
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.program_code()?;

        let table = self.rate_table();
        let entries = [
            ("non_graduate_monthly", table.non_graduate_monthly),
            ("non_graduate_bi_monthly", table.non_graduate_bi_monthly),
            ("graduate_monthly", table.graduate_monthly),
            ("graduate_bi_monthly", table.graduate_bi_monthly),
            ("scholarship_discount", table.scholarship_discount),
        ];
        for (name, value) in entries {
            if value < 0 {
                return Err(ValidationError::NegativeRate(name));
            }
            if value > RateTable::MAX_ENTRY_CENTS {
                return Err(ValidationError::RateTooLarge(name));
            }
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_program: default_program(),
            rates: RateOverrides::default(),
        }
    }
}

fn default_program() -> String {
    "MAHAD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_rates() {
        let config = BillingConfig::default();
        assert_eq!(config.rate_table(), RateTable::STANDARD);
        assert_eq!(config.program_code().unwrap().as_str(), "MAHAD");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_replace_only_set_entries() {
        let config = BillingConfig {
            rates: RateOverrides {
                graduate_monthly: Some(10_001),
                ..Default::default()
            },
            ..Default::default()
        };

        let table = config.rate_table();

        assert_eq!(table.graduate_monthly, 10_001);
        assert_eq!(table.non_graduate_monthly, RateTable::STANDARD.non_graduate_monthly);
    }

    #[test]
    fn negative_rate_is_rejected() {
        let config = BillingConfig {
            rates: RateOverrides {
                scholarship_discount: Some(-1),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::NegativeRate("scholarship_discount"))
        );
    }

    #[test]
    fn oversized_rate_is_rejected() {
        let config = BillingConfig {
            rates: RateOverrides {
                non_graduate_bi_monthly: Some(i64::MAX),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::RateTooLarge("non_graduate_bi_monthly"))
        );
    }

    #[test]
    fn blank_program_is_rejected() {
        let config = BillingConfig {
            default_program: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidProgramCode));
    }
}
