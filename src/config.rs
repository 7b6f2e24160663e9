//! Environment-driven configuration for the sweep binary.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::charges::ChargeRates;
use crate::error::{Error, invalid_amount};

/// All knobs of the sweep, read from the environment with sensible defaults
/// for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ledger API
    pub ledger_url: String,
    pub ledger_auth_token: String,
    /// Base URL of the payment processor API
    pub processor_url: String,
    pub processor_auth_token: String,
    /// Base URL of the notification service
    pub notify_url: String,
    pub notify_auth_token: String,

    /// Public site link included in some notification templates
    pub site_url: String,
    /// Help page link included in some notification templates
    pub help_url: String,
    /// Compliance contact for rejection notices; falls back to the help link
    pub compliance_contact: Option<String>,

    pub charge_rates: ChargeRates,

    /// Per-request timeout for every remote call
    pub request_timeout: Duration,
    /// Payments with a pending, unactioned security check are only re-checked
    /// once older than this
    pub check_age_threshold: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let percentage = env_decimal("SERVICE_CHARGE_PERCENTAGE", Decimal::new(24, 1))?;
        let fixed_pence = env_decimal("SERVICE_CHARGE_FIXED", Decimal::from(20))?;
        let help_url = env_or("HELP_URL", "http://localhost:8004/help/");

        Ok(Self {
            ledger_url: env_or("LEDGER_URL", "http://localhost:8000"),
            ledger_auth_token: env_or("LEDGER_AUTH_TOKEN", ""),
            processor_url: env_or("PROCESSOR_URL", "http://localhost:8008/v1"),
            processor_auth_token: env_or("PROCESSOR_AUTH_TOKEN", ""),
            notify_url: env_or("NOTIFY_URL", "http://localhost:8005"),
            notify_auth_token: env_or("NOTIFY_AUTH_TOKEN", ""),
            site_url: env_or("SITE_URL", "http://localhost:8004"),
            help_url,
            compliance_contact: std::env::var("COMPLIANCE_CONTACT_EMAIL").ok(),
            charge_rates: ChargeRates::new(percentage, fixed_pence),
            request_timeout: Duration::from_secs(15),
            check_age_threshold: chrono::Duration::hours(env_i64(
                "CHECK_AGE_THRESHOLD_HOURS",
                8,
            )?),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_decimal(key: &str, default: Decimal) -> Result<Decimal, Error> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| invalid_amount(format!("{key} is not a number: {value:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_i64(key: &str, default: i64) -> Result<i64, Error> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| invalid_amount(format!("{key} is not a number: {value:?}"))),
        Err(_) => Ok(default),
    }
}
