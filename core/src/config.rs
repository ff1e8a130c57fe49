use std::fmt;
use std::time::Duration;

pub const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
pub const DEFAULT_TRAVELPAYOUTS_BASE_URL: &str = "https://api.travelpayouts.com";
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("unknown flight provider {0:?}, expected amadeus, travelpayouts or sample")]
    UnknownProvider(String),
}

#[derive(Clone)]
pub struct AmadeusConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

impl fmt::Debug for AmadeusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmadeusConfig")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct TravelpayoutsConfig {
    pub token: String,
    pub marker: String,
    pub base_url: String,
}

impl fmt::Debug for TravelpayoutsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TravelpayoutsConfig")
            .field("token", &"<redacted>")
            .field("marker", &self.marker)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Amadeus(AmadeusConfig),
    Travelpayouts(TravelpayoutsConfig),
    Sample { marker: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub max_results: usize,
    pub upstream_timeout: Duration,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values are treated the same as unset ones
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let provider_name = require("FLIGHT_PROVIDER")?;
        let provider = match provider_name.to_ascii_lowercase().as_str() {
            "amadeus" => ProviderConfig::Amadeus(AmadeusConfig {
                api_key: require("AMADEUS_API_KEY")?,
                api_secret: require("AMADEUS_API_SECRET")?,
                base_url: get("AMADEUS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_AMADEUS_BASE_URL.to_string()),
            }),
            "travelpayouts" => ProviderConfig::Travelpayouts(TravelpayoutsConfig {
                token: require("TRAVELPAYOUTS_TOKEN")?,
                marker: require("TRAVELPAYOUTS_MARKER")?,
                base_url: get("TRAVELPAYOUTS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_TRAVELPAYOUTS_BASE_URL.to_string()),
            }),
            "sample" => ProviderConfig::Sample {
                marker: get("TRAVELPAYOUTS_MARKER"),
            },
            _ => return Err(ConfigError::UnknownProvider(provider_name)),
        };

        let max_results = match get("SEARCH_MAX_RESULTS") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if (1..=250).contains(&n) => n,
                _ => return Err(ConfigError::Invalid { key: "SEARCH_MAX_RESULTS", value }),
            },
            None => DEFAULT_MAX_RESULTS,
        };

        let timeout_secs = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid { key: "UPSTREAM_TIMEOUT_SECS", value }),
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            provider,
            max_results,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_provider_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("FLIGHT_PROVIDER"));
    }

    #[test]
    fn test_amadeus_requires_both_credentials() {
        let err = load(&[("FLIGHT_PROVIDER", "amadeus"), ("AMADEUS_API_KEY", "key")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AMADEUS_API_SECRET"));

        let err = load(&[
            ("FLIGHT_PROVIDER", "amadeus"),
            ("AMADEUS_API_KEY", "  "),
            ("AMADEUS_API_SECRET", "secret"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("AMADEUS_API_KEY"));
    }

    #[test]
    fn test_amadeus_defaults() {
        let config = load(&[
            ("FLIGHT_PROVIDER", "Amadeus"),
            ("AMADEUS_API_KEY", "key"),
            ("AMADEUS_API_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.upstream_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        match config.provider {
            ProviderConfig::Amadeus(ref amadeus) => {
                assert_eq!(amadeus.base_url, DEFAULT_AMADEUS_BASE_URL)
            }
            other => panic!("expected amadeus, got {other:?}"),
        }
    }

    #[test]
    fn test_travelpayouts_has_no_fallback_marker() {
        let err = load(&[("FLIGHT_PROVIDER", "travelpayouts"), ("TRAVELPAYOUTS_TOKEN", "t")])
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("TRAVELPAYOUTS_MARKER"));
    }

    #[test]
    fn test_sample_marker_is_optional() {
        let config = load(&[("FLIGHT_PROVIDER", "sample"), ("SEARCH_MAX_RESULTS", "5")]).unwrap();
        assert_eq!(config.max_results, 5);
        assert!(matches!(config.provider, ProviderConfig::Sample { marker: None }));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load(&[("FLIGHT_PROVIDER", "skyscanner")]),
            Err(ConfigError::UnknownProvider(_))
        ));
        assert!(matches!(
            load(&[("FLIGHT_PROVIDER", "sample"), ("SEARCH_MAX_RESULTS", "0")]),
            Err(ConfigError::Invalid { key: "SEARCH_MAX_RESULTS", .. })
        ));
        assert!(matches!(
            load(&[("FLIGHT_PROVIDER", "sample"), ("UPSTREAM_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { key: "UPSTREAM_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("FLIGHT_PROVIDER", "amadeus"),
            ("AMADEUS_API_KEY", "my-key"),
            ("AMADEUS_API_SECRET", "my-secret"),
        ])
        .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("my-key"));
        assert!(!printed.contains("my-secret"));
    }
}
