//! Client configuration.
//!
//! The mock/real switch is a plain value here. It is read once (from the
//! environment or set by the host) and handed to [`Backend::from_config`],
//! so every API consumer can be built against either backend.
//!
//! [`Backend::from_config`]: crate::api::Backend::from_config

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::error::{Result, RunmateError};

pub const ENV_API_BASE_URL: &str = "RUNMATE_API_BASE_URL";
pub const ENV_USE_MOCK: &str = "RUNMATE_USE_MOCK";
pub const ENV_TIMEOUT_MS: &str = "RUNMATE_TIMEOUT_MS";
pub const ENV_MOCK_LATENCY_MS: &str = "RUNMATE_MOCK_LATENCY_MS";
pub const ENV_PLACES_API_KEY: &str = "RUNMATE_PLACES_API_KEY";
pub const ENV_USE_FIXED_LOCATION: &str = "RUNMATE_USE_FIXED_LOCATION";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Runtime configuration for the client core.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the REST backend (no trailing slash)
    pub api_base_url: String,
    /// Serve every API call from fixture data instead of the network
    pub use_mock: bool,
    /// Per-request timeout for the REST backend
    pub request_timeout: Duration,
    /// Artificial delay added to mock responses
    pub mock_latency: Duration,
    /// REST key for the place-name lookup; lookups fall back when absent
    pub places_api_key: Option<String>,
    /// Ignore device position and use the fixed default coordinate
    pub use_fixed_location: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            use_mock: false,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            mock_latency: Duration::ZERO,
            places_api_key: None,
            use_fixed_location: false,
        }
    }
}

impl Config {
    /// Mock configuration with no simulated latency, handy for tests and demos.
    pub fn mock() -> Self {
        Self {
            use_mock: true,
            ..Self::default()
        }
    }

    /// Load configuration from `RUNMATE_*` environment variables.
    ///
    /// Missing variables fall back to defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup(ENV_API_BASE_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                info!("{ENV_API_BASE_URL} not set, using default: {DEFAULT_API_BASE_URL}");
                defaults.api_base_url.clone()
            });

        let use_mock = parse_or(&lookup, ENV_USE_MOCK, defaults.use_mock)?;
        let timeout_ms = parse_or(&lookup, ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;
        let latency_ms = parse_or(&lookup, ENV_MOCK_LATENCY_MS, 0u64)?;
        let use_fixed_location =
            parse_or(&lookup, ENV_USE_FIXED_LOCATION, defaults.use_fixed_location)?;

        let places_api_key = lookup(ENV_PLACES_API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if timeout_ms == 0 {
            return Err(RunmateError::Config {
                message: format!("{ENV_TIMEOUT_MS} must be greater than zero"),
            });
        }

        Ok(Self {
            api_base_url,
            use_mock,
            request_timeout: Duration::from_millis(timeout_ms),
            mock_latency: Duration::from_millis(latency_ms),
            places_api_key,
            use_fixed_location,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_mock(mut self, use_mock: bool) -> Self {
        self.use_mock = use_mock;
        self
    }

    pub fn with_mock_latency(mut self, latency: Duration) -> Self {
        self.mock_latency = latency;
        self
    }

    pub fn with_places_api_key(mut self, key: impl Into<String>) -> Self {
        self.places_api_key = Some(key.into());
        self
    }

    pub fn with_fixed_location(mut self, fixed: bool) -> Self {
        self.use_fixed_location = fixed;
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e| RunmateError::Config {
            message: format!("Invalid {key} value {raw:?}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.use_mock);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_API_BASE_URL, "https://api.example.com/"),
            (ENV_USE_MOCK, "true"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_MOCK_LATENCY_MS, "300"),
            (ENV_PLACES_API_KEY, " abc "),
            (ENV_USE_FIXED_LOCATION, "true"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert!(config.use_mock);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.mock_latency, Duration::from_millis(300));
        assert_eq!(config.places_api_key.as_deref(), Some("abc"));
        assert!(config.use_fixed_location);
    }

    #[test]
    fn test_rejects_malformed_values() {
        let err = Config::from_lookup(lookup_from(&[(ENV_USE_MOCK, "yes")])).unwrap_err();
        assert!(matches!(err, RunmateError::Config { .. }));

        let err = Config::from_lookup(lookup_from(&[(ENV_TIMEOUT_MS, "0")])).unwrap_err();
        assert!(matches!(err, RunmateError::Config { .. }));
    }

    #[test]
    fn test_builder() {
        let config = Config::mock()
            .with_base_url("http://10.0.2.2:8080/")
            .with_mock_latency(Duration::from_millis(50));
        assert!(config.use_mock);
        assert_eq!(config.api_base_url, "http://10.0.2.2:8080");
        assert_eq!(config.mock_latency, Duration::from_millis(50));
    }
}
