//! Application configuration module
//!
//! Configuration is loaded from environment variables with the
//! `TUITION_BILLING` prefix; nested values are separated by `__`.
//!
//! # Example
//!
//! ```no_run
//! use tuition_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod billing;
mod database;
mod error;
mod payment;
mod server;

pub use billing::{BillingConfig, RateOverrides};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Stripe webhook settings
    pub payment: PaymentConfig,

    /// Default program and rate table
    #[serde(default)]
    pub billing: BillingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `TUITION_BILLING__*` variables:
    ///
    /// - `TUITION_BILLING__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TUITION_BILLING__BILLING__RATES__GRADUATE_MONTHLY=9500`
    ///   -> `billing.rates.graduate_monthly = 9500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TUITION_BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.billing.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; tests touching them run one at a time.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "TUITION_BILLING__DATABASE__URL",
            "postgresql://test@localhost/billing",
        );
        env::set_var("TUITION_BILLING__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        for key in [
            "TUITION_BILLING__DATABASE__URL",
            "TUITION_BILLING__PAYMENT__STRIPE_WEBHOOK_SECRET",
            "TUITION_BILLING__SERVER__PORT",
            "TUITION_BILLING__SERVER__ENVIRONMENT",
            "TUITION_BILLING__BILLING__DEFAULT_PROGRAM",
            "TUITION_BILLING__BILLING__RATES__GRADUATE_MONTHLY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/billing");
        assert_eq!(config.payment.stripe_webhook_secret, "whsec_xxx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.billing.default_program, "MAHAD");
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("TUITION_BILLING__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_billing_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("TUITION_BILLING__SERVER__PORT", "3000");
        env::set_var("TUITION_BILLING__BILLING__DEFAULT_PROGRAM", "dugsi");
        env::set_var("TUITION_BILLING__BILLING__RATES__GRADUATE_MONTHLY", "9900");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.billing.program_code().unwrap().as_str(), "DUGSI");
        assert_eq!(config.billing.rate_table().graduate_monthly, 9900);
    }

    #[test]
    fn test_missing_database_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("TUITION_BILLING__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
