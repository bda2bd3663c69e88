//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `AVIARIO_CHECKOUT_DELAY_MS` - Simulated order processing time (default: 2000)
//! - `AVIARIO_FREE_SHIPPING_THRESHOLD` - Cart total for the free shipping hint (default: 500.00)
//! - `AVIARIO_MAX_INSTALLMENTS` - Largest installment count offered (default: 12)
//! - `AVIARIO_BLOCK_OUT_OF_STOCK` - Reject out-of-stock products in the cart (default: false)
//! - `AVIARIO_CATALOG_PATH` - JSON or YAML product file (default: built-in catalog)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

const DEFAULT_CHECKOUT_DELAY_MS: u64 = 2000;
const DEFAULT_FREE_SHIPPING_THRESHOLD_REAIS: i64 = 500;
const DEFAULT_MAX_INSTALLMENTS: u32 = 12;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// How long a simulated checkout submission takes
    pub checkout_delay: Duration,
    /// Cart total at which shipping becomes free
    pub free_shipping_threshold: Decimal,
    /// Largest installment count offered at checkout
    pub max_installments: u32,
    /// Whether the session refuses to add out-of-stock products to the cart
    pub block_out_of_stock: bool,
    /// Product file to load instead of the built-in catalog
    pub catalog_path: Option<PathBuf>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            checkout_delay: Duration::from_millis(DEFAULT_CHECKOUT_DELAY_MS),
            free_shipping_threshold: Decimal::new(DEFAULT_FREE_SHIPPING_THRESHOLD_REAIS, 0),
            max_installments: DEFAULT_MAX_INSTALLMENTS,
            block_out_of_stock: false,
            catalog_path: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a present value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let delay_ms = parse_or(
            &lookup,
            "AVIARIO_CHECKOUT_DELAY_MS",
            DEFAULT_CHECKOUT_DELAY_MS,
        )?;
        let free_shipping_threshold = parse_or(
            &lookup,
            "AVIARIO_FREE_SHIPPING_THRESHOLD",
            defaults.free_shipping_threshold,
        )?;
        if free_shipping_threshold.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "AVIARIO_FREE_SHIPPING_THRESHOLD".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let max_installments = parse_or(
            &lookup,
            "AVIARIO_MAX_INSTALLMENTS",
            defaults.max_installments,
        )?;
        if max_installments == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AVIARIO_MAX_INSTALLMENTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let block_out_of_stock = parse_bool(&lookup, "AVIARIO_BLOCK_OUT_OF_STOCK")?;
        let catalog_path = lookup("AVIARIO_CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            checkout_delay: Duration::from_millis(delay_ms),
            free_shipping_threshold,
            max_installments,
            block_out_of_stock,
            catalog_path,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable if present, otherwise use the default.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`), defaulting to false.
fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.checkout_delay, Duration::from_secs(2));
        assert_eq!(config.free_shipping_threshold, Decimal::new(500, 0));
        assert_eq!(config.max_installments, 12);
        assert!(!config.block_out_of_stock);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("AVIARIO_CHECKOUT_DELAY_MS", "10"),
            ("AVIARIO_FREE_SHIPPING_THRESHOLD", "299.90"),
            ("AVIARIO_MAX_INSTALLMENTS", "6"),
            ("AVIARIO_BLOCK_OUT_OF_STOCK", "yes"),
            ("AVIARIO_CATALOG_PATH", "birds.yaml"),
        ]))
        .unwrap();

        assert_eq!(config.checkout_delay, Duration::from_millis(10));
        assert_eq!(config.free_shipping_threshold, Decimal::new(29990, 2));
        assert_eq!(config.max_installments, 6);
        assert!(config.block_out_of_stock);
        assert_eq!(config.catalog_path, Some(PathBuf::from("birds.yaml")));
    }

    #[test]
    fn test_rejects_non_numeric_delay() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("AVIARIO_CHECKOUT_DELAY_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "AVIARIO_CHECKOUT_DELAY_MS"));
    }

    #[test]
    fn test_rejects_zero_installments() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("AVIARIO_MAX_INSTALLMENTS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_boolean() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("AVIARIO_BLOCK_OUT_OF_STOCK", "maybe")]));
        assert!(result.is_err());
    }
}
