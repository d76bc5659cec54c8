//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod ledger;
mod storage;

pub use ledger::{IdempotencyConfig, LedgerConfig};
pub use storage::{StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "LOYALTY_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "LOYALTY";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "LOYALTY_LOG";
/// Environment variable selecting the log formatter (`text` or `json`).
pub const LOG_FORMAT_ENV_VAR: &str = "LOYALTY_LOG_FORMAT";

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Points accounting rules.
    pub ledger: LedgerConfig,
    /// Idempotency record retention.
    pub idempotency: IdempotencyConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate()?;
        self.idempotency.validate()
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.ledger.daily_cap, 5000);
        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert!(config.idempotency.ttl_secs.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
ledger:
  daily_cap: 1000
  earn_rate: 50
  currency: GHS
  timezone: Africa/Accra

idempotency:
  ttl_secs: 86400
  reap_interval_secs: 60

storage:
  type: memory
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ledger.daily_cap, 1000);
        assert_eq!(config.ledger.earn_rate, 50);
        assert_eq!(config.ledger.currency, "GHS");
        assert_eq!(config.idempotency.ttl_secs, Some(86400));
        assert_eq!(config.idempotency.reap_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("ledger:\n  daily_cap: 10\n").unwrap();
        assert_eq!(config.ledger.daily_cap, 10);
        assert_eq!(config.ledger.earn_rate, 100);
        assert_eq!(config.ledger.timezone, "Africa/Lagos");
    }

    #[test]
    #[serial]
    fn test_load_file_with_env_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "ledger:\n  daily_cap: 1200\n  currency: NGN").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        std::env::set_var("LOYALTY__LEDGER__EARN_RATE", "25");
        let config = Config::load(Some(&path));
        std::env::remove_var("LOYALTY__LEDGER__EARN_RATE");

        let config = config.unwrap();
        assert_eq!(config.ledger.daily_cap, 1200);
        assert_eq!(config.ledger.earn_rate, 25);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_timezone() {
        std::env::set_var("LOYALTY__LEDGER__TIMEZONE", "Nowhere/Special");
        let result = Config::load(None);
        std::env::remove_var("LOYALTY__LEDGER__TIMEZONE");

        assert!(result.is_err());
    }
}
