//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MOSTRADOR_BIND` | `0.0.0.0` |
//! | `MOSTRADOR_PORT` | `8080` |
//! | `DATABASE_PATH` | `./mostrador.db` |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `RATES_URL` | `https://dolarapi.com/v1/dolares` |
//! | `RATES_QUOTE` | `blue` |
//! | `RATES_FALLBACK_QUOTE` | `oficial` |
//! | `RATES_TTL_SECS` | `900` |
//! | `RATES_TIMEOUT_SECS` | `10` |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use mostrador_rates::RatesConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: IpAddr,
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    pub db_max_connections: u32,

    /// Exchange rate source settings
    pub rates: RatesConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RatesConfig::default();

        let config = ApiConfig {
            bind: parse_or(&lookup, "MOSTRADOR_BIND", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, "MOSTRADOR_PORT", 8080)?,
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "./mostrador.db".to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            rates: RatesConfig {
                url: lookup("RATES_URL").unwrap_or(defaults.url),
                quote: lookup("RATES_QUOTE").unwrap_or(defaults.quote),
                fallback_quote: lookup("RATES_FALLBACK_QUOTE").unwrap_or(defaults.fallback_quote),
                ttl: Duration::from_secs(parse_or(&lookup, "RATES_TTL_SECS", 900)?),
                timeout: Duration::from_secs(parse_or(&lookup, "RATES_TIMEOUT_SECS", 10)?),
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.rates.timeout.is_zero() {
            return Err(ConfigError::InvalidValue("RATES_TIMEOUT_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.database_path, "./mostrador.db");
        assert_eq!(config.rates.quote, "blue");
        assert_eq!(config.rates.fallback_quote, "oficial");
        assert_eq!(config.rates.ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MOSTRADOR_PORT", "3000"),
            ("MOSTRADOR_BIND", "127.0.0.1"),
            ("RATES_QUOTE", "oficial"),
            ("RATES_TTL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.rates.quote, "oficial");
        assert_eq!(config.rates.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("MOSTRADOR_PORT", "http")]),
            Err(ConfigError::InvalidValue(ref k)) if k == "MOSTRADOR_PORT"
        ));
        assert!(load(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(load(&[("RATES_TIMEOUT_SECS", "-1")]).is_err());
    }
}
