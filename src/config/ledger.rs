//! Points rules and idempotency retention configuration.

use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use super::ConfigError;

/// Points accounting rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum points creditable to one customer per local calendar day.
    pub daily_cap: i64,
    /// Minor units of currency per point credited.
    pub earn_rate: i64,
    /// The only currency accepted for earning (ISO code).
    pub currency: String,
    /// IANA timezone whose calendar day the daily cap follows.
    pub timezone: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            daily_cap: 5000,
            earn_rate: 100,
            currency: "NGN".to_string(),
            timezone: "Africa/Lagos".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Resolve the configured IANA timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.earn_rate <= 0 {
            return Err(ConfigError::Invalid(format!(
                "ledger.earn_rate must be positive, got {}",
                self.earn_rate
            )));
        }
        if self.daily_cap < 0 {
            return Err(ConfigError::Invalid(format!(
                "ledger.daily_cap must not be negative, got {}",
                self.daily_cap
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ledger.currency must not be empty".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }
}

/// Idempotency record retention.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    /// Records older than this are treated as absent and reaped.
    /// None = records live for the lifetime of the process.
    pub ttl_secs: Option<u64>,
    /// How often the reaper runs when a TTL is set.
    pub reap_interval_secs: u64,
}

impl IdempotencyConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reap_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "idempotency.reap_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            reap_interval_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_config_default() {
        let config = LedgerConfig::default();
        assert_eq!(config.daily_cap, 5000);
        assert_eq!(config.earn_rate, 100);
        assert_eq!(config.currency, "NGN");
        assert_eq!(config.timezone, "Africa/Lagos");
    }

    #[test]
    fn test_default_ledger_config_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
        assert_eq!(LedgerConfig::default().tz().unwrap(), chrono_tz::Africa::Lagos);
    }

    #[test]
    fn test_zero_earn_rate_rejected() {
        let config = LedgerConfig {
            earn_rate: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("earn_rate"));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let config = LedgerConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTimezone(tz)) if tz == "Mars/Olympus_Mons"
        ));
    }

    #[test]
    fn test_idempotency_config_default_never_expires() {
        let config = IdempotencyConfig::default();
        assert!(config.ttl().is_none());
        assert_eq!(config.reap_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_reap_interval_rejected() {
        let config = IdempotencyConfig {
            ttl_secs: Some(60),
            reap_interval_secs: 0,
        };
        assert!(config.validate().is_err());
    }
}
