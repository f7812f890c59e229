//! Runtime settings for contact persistence.
//!
//! # Invariants
//! - `storage_key` is non-empty and free of surrounding whitespace.
//! - `quota_bytes` is positive.
//! - `usage_warning_ratio` lies in `(0.0, 1.0]`.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key under which the contact blob is stored.
pub const DEFAULT_STORAGE_KEY: &str = "contactos";
/// Quota assumed when the store does not report one (typical browser limit).
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
/// Usage share above which a higher-capacity store is suggested.
pub const DEFAULT_USAGE_WARNING_RATIO: f64 = 0.70;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub storage_key: String,
    pub quota_bytes: u64,
    pub usage_warning_ratio: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            usage_warning_ratio: DEFAULT_USAGE_WARNING_RATIO,
        }
    }
}

impl PortfolioConfig {
    /// Checks value ranges; returns the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.storage_key.as_str();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if key.trim() != key {
            return Err(ConfigError::InvalidStorageKey(key.to_string()));
        }
        if self.quota_bytes == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if !(self.usage_warning_ratio > 0.0 && self.usage_warning_ratio <= 1.0) {
            return Err(ConfigError::InvalidWarningRatio(self.usage_warning_ratio));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyStorageKey,
    InvalidStorageKey(String),
    ZeroQuota,
    InvalidWarningRatio(f64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorageKey => write!(f, "storage key cannot be empty"),
            Self::InvalidStorageKey(key) => {
                write!(f, "storage key `{key}` must not have surrounding whitespace")
            }
            Self::ZeroQuota => write!(f, "quota must be greater than zero bytes"),
            Self::InvalidWarningRatio(ratio) => {
                write!(f, "usage warning ratio {ratio} must be within (0, 1]")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PortfolioConfig, DEFAULT_QUOTA_BYTES};

    #[test]
    fn defaults_are_valid() {
        let config = PortfolioConfig::default();
        assert_eq!(config.storage_key, "contactos");
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = PortfolioConfig {
            usage_warning_ratio: 1.5,
            ..PortfolioConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidWarningRatio(1.5)
        );

        let config = PortfolioConfig {
            storage_key: " contactos".to_string(),
            ..PortfolioConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidStorageKey(_)
        ));

        let config = PortfolioConfig {
            quota_bytes: 0,
            ..PortfolioConfig::default()
        };
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroQuota);
    }
}
