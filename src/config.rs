use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_SESSION_KEY: &str = "cart";
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_MAX_LINE_QUANTITY: i32 = 10_000;
const CONFIG_DIR: &str = "config";

/// Application configuration for the cart component.
///
/// Loaded from `config/default.toml`, an environment-specific overlay, and
/// `STOREFRONT__`-prefixed environment variables, in that order.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CartConfig {
    /// Session key under which the cart structure is stored
    #[serde(default = "default_session_key")]
    #[validate(length(min = 1))]
    pub session_key: String,

    /// ISO 4217 currency code used for display
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Upper bound on a single line's quantity, guarding absurd inputs
    #[serde(default = "default_max_line_quantity")]
    #[validate(range(min = 1))]
    pub max_line_quantity: i32,
}

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_line_quantity() -> i32 {
    DEFAULT_MAX_LINE_QUANTITY
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            session_key: default_session_key(),
            currency: default_currency(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            max_line_quantity: default_max_line_quantity(),
        }
    }
}

impl CartConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum CartConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Load configuration from files and environment.
///
/// `RUN_ENV` (or `APP_ENV`) selects the overlay profile; a missing config
/// directory falls back to built-in defaults so library consumers and tests
/// never require files on disk.
pub fn load_config() -> Result<CartConfig, CartConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("session_key", DEFAULT_SESSION_KEY)?
        .set_default("currency", DEFAULT_CURRENCY)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("max_line_quantity", DEFAULT_MAX_LINE_QUANTITY as i64)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("STOREFRONT").separator("__"))
        .build()?;

    let cart_config: CartConfig = config.try_deserialize()?;

    cart_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        CartConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(cart_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CartConfig::default();
        assert_eq!(cfg.session_key, "cart");
        assert_eq!(cfg.currency, "USD");
        assert_eq!(cfg.max_line_quantity, 10_000);
        assert!(!cfg.log_json);
        assert!(!cfg.is_production());
    }

    #[test]
    fn test_validation_rejects_empty_session_key() {
        let cfg = CartConfig {
            session_key: String::new(),
            ..CartConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_currency_code() {
        let cfg = CartConfig {
            currency: "DOLLARS".to_string(),
            ..CartConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nonpositive_quantity_ceiling() {
        let cfg = CartConfig {
            max_line_quantity: 0,
            ..CartConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
