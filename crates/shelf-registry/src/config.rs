//! Registry configuration.

use serde::{Deserialize, Serialize};
use shelf_token::Address;
use std::path::Path;
use thiserror::Error;

/// Label the default registry address is derived from.
pub const DEFAULT_REGISTRY_LABEL: &str = "shelf:registry";

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON for this schema.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for a registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Length of one billing period in seconds (a minute).
    pub billing_period_secs: u64,
    /// Periods charged even when a rental is returned immediately.
    pub minimum_billable_periods: u64,
    /// Account that holds escrow. Derived from [`DEFAULT_REGISTRY_LABEL`] when unset.
    pub registry_address: Option<Address>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            billing_period_secs: 60,
            minimum_billable_periods: 1,
            registry_address: None,
        }
    }
}

impl RegistryConfig {
    /// Parse from a JSON document and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file and validate.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.billing_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "billing_period_secs must be greater than 0".to_string(),
            ));
        }
        if self.minimum_billable_periods == 0 {
            return Err(ConfigError::Invalid(
                "minimum_billable_periods must be greater than 0".to_string(),
            ));
        }
        if self.registry_address.as_ref().is_some_and(Address::is_zero) {
            return Err(ConfigError::Invalid(
                "registry_address cannot be the zero address".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether this is the plain per-minute schedule: one-minute periods,
    /// at least one charged.
    #[must_use]
    pub const fn bills_per_minute(&self) -> bool {
        self.billing_period_secs == crate::escrow::SECONDS_PER_MINUTE && self.minimum_billable_periods == 1
    }

    /// The escrow-holding account.
    #[must_use]
    pub fn resolved_address(&self) -> Address {
        self.registry_address
            .clone()
            .unwrap_or_else(|| Address::derive(DEFAULT_REGISTRY_LABEL))
    }
}
