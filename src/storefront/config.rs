// storefront/config.rs - Runtime configuration from the environment

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::storefront::debounce::DEFAULT_SEARCH_DELAY;
use crate::storefront::model::DEFAULT_PAGE_SIZE;

pub const API_BASE_VAR: &str = "UCHIGIFT_API_BASE";
pub const BIND_ADDR_VAR: &str = "UCHIGIFT_BIND_ADDR";
pub const TIMEOUT_VAR: &str = "UCHIGIFT_TIMEOUT_MS";
pub const DEBOUNCE_VAR: &str = "UCHIGIFT_DEBOUNCE_MS";
pub const PAGE_SIZE_VAR: &str = "UCHIGIFT_PAGE_SIZE";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be a socket address like 127.0.0.1:3000, got {value:?}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub page_size: u32,
}

impl AppConfig {
    /// Read the process environment (after `dotenv()` has populated it)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset or blank variables take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let api_base = match get(API_BASE_VAR) {
            Some(value) => {
                let parsed = url::Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl {
                    var: API_BASE_VAR,
                    value: value.clone(),
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidUrl {
                        var: API_BASE_VAR,
                        value,
                    });
                }
                value.trim().trim_end_matches('/').to_string()
            }
            None => DEFAULT_API_BASE.to_string(),
        };

        let bind_addr = get(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress {
                var: BIND_ADDR_VAR,
                value: bind_addr.clone(),
            })?;

        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match get(var) {
                Some(value) => positive(var, &value).map(Duration::from_millis),
                None => Ok(default),
            }
        };

        let page_size = match get(PAGE_SIZE_VAR) {
            Some(value) => {
                let size = positive(PAGE_SIZE_VAR, &value)?;
                u32::try_from(size).map_err(|_| ConfigError::InvalidNumber {
                    var: PAGE_SIZE_VAR,
                    value,
                })?
            }
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_base,
            bind_addr,
            request_timeout: millis(TIMEOUT_VAR, DEFAULT_TIMEOUT)?,
            debounce: millis(DEBOUNCE_VAR, DEFAULT_SEARCH_DELAY)?,
            page_size,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_timeout: DEFAULT_TIMEOUT,
            debounce: DEFAULT_SEARCH_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size, 48);
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_BASE_VAR, "https://api.example.jp/api/v1/"),
            (BIND_ADDR_VAR, "0.0.0.0:8080"),
            (TIMEOUT_VAR, "2500"),
            (DEBOUNCE_VAR, "300"),
            (PAGE_SIZE_VAR, "24"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://api.example.jp/api/v1");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.page_size, 24);
    }

    #[test]
    fn test_blank_value_takes_default() {
        let config = AppConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "  ")])).unwrap();
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[(PAGE_SIZE_VAR, "0")])),
            Err(ConfigError::InvalidNumber {
                var: PAGE_SIZE_VAR,
                value: "0".into()
            })
        );
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(BIND_ADDR_VAR, "localhost")])),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(API_BASE_VAR, "ftp://example.jp")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "ten")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
