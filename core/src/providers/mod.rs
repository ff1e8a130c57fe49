//! Upstream flight data sources. Exactly one is active per deployment,
//! picked by `FLIGHT_PROVIDER`.

pub mod amadeus;
pub mod sample;
pub mod travelpayouts;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::{Config, ProviderConfig};
use crate::error::SearchError;
use crate::offer::{FlightEndpoint, FlightOffer};
use crate::request::SearchRequest;

pub use amadeus::AmadeusProvider;
pub use sample::SampleProvider;
pub use travelpayouts::TravelpayoutsProvider;

#[async_trait]
pub trait FlightProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one search upstream and maps the results into [`FlightOffer`]s.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError>;
}

pub fn build_provider(config: &Config) -> Result<Arc<dyn FlightProvider>, SearchError> {
    let client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .user_agent(concat!("flight-search/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let provider: Arc<dyn FlightProvider> = match &config.provider {
        ProviderConfig::Amadeus(amadeus) => Arc::new(AmadeusProvider::new(
            client,
            amadeus.clone(),
            config.max_results,
        )),
        ProviderConfig::Travelpayouts(tp) => Arc::new(TravelpayoutsProvider::new(
            client,
            tp.clone(),
            config.max_results,
        )),
        ProviderConfig::Sample { marker } => Arc::new(SampleProvider::new(marker.clone())),
    };

    tracing::info!(provider = provider.name(), max_results = config.max_results, "flight provider ready");
    Ok(provider)
}

/// Stand-in used when configuration could not be loaded. Every search fails
/// with a configuration error so callers get a 500 instead of no response.
pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        UnconfiguredProvider { reason: reason.into() }
    }
}

#[async_trait]
impl FlightProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError> {
        Err(SearchError::Configuration(self.reason.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrors {
    #[serde(default)]
    errors: Vec<UpstreamErrorItem>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorItem {
    detail: Option<String>,
    title: Option<String>,
}

/// Turns a non-success upstream response into the matching [`SearchError`].
pub(crate) async fn upstream_failure(response: reqwest::Response) -> SearchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, body = %body, "upstream request failed");
    classify_failure(status, &body)
}

pub(crate) fn classify_failure(status: StatusCode, body: &str) -> SearchError {
    match status {
        StatusCode::UNAUTHORIZED => SearchError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited,
        _ => match serde_json::from_str::<UpstreamErrors>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => {
                let first = &parsed.errors[0];
                let detail = first
                    .detail
                    .clone()
                    .or_else(|| first.title.clone())
                    .unwrap_or_else(|| "Search failed".to_string());
                SearchError::UpstreamRejected(detail)
            }
            _ => SearchError::Upstream(status),
        },
    }
}

/// Splits a local timestamp like `2024-03-15T10:30:00` into its endpoint.
pub(crate) fn endpoint(code: &str, at: &str) -> Result<FlightEndpoint, SearchError> {
    let parsed = NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M"))
        .map_err(|_| SearchError::Malformed(format!("unreadable timestamp {at:?}")))?;

    Ok(FlightEndpoint {
        code: code.to_string(),
        time: parsed.format("%H:%M").to_string(),
        date: parsed.format("%Y-%m-%d").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, ""),
            SearchError::AuthenticationFailed
        ));
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "{}"),
            SearchError::RateLimited
        ));

        let body = r#"{"errors":[{"status":400,"code":477,"title":"INVALID FORMAT","detail":"invalid date"}]}"#;
        match classify_failure(StatusCode::BAD_REQUEST, body) {
            SearchError::UpstreamRejected(detail) => assert_eq!(detail, "invalid date"),
            other => panic!("unexpected {other:?}"),
        }

        let body = r#"{"errors":[{"title":"SYSTEM ERROR HAS OCCURRED"}]}"#;
        match classify_failure(StatusCode::INTERNAL_SERVER_ERROR, body) {
            SearchError::UpstreamRejected(detail) => assert_eq!(detail, "SYSTEM ERROR HAS OCCURRED"),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            SearchError::Upstream(StatusCode::BAD_GATEWAY)
        ));
    }

    #[test]
    fn test_endpoint_splits_timestamp() {
        let e = endpoint("DAC", "2024-03-15T21:55:00").unwrap();
        assert_eq!(e.time, "21:55");
        assert_eq!(e.date, "2024-03-15");

        assert!(endpoint("DAC", "21:55").is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_reports_configuration_error() {
        let provider = UnconfiguredProvider::new("missing setting AMADEUS_API_KEY");
        let request = crate::request::SearchParams {
            from: Some("DAC".into()),
            to: Some("LHR".into()),
            date: Some("2024-03-15".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let err = provider.search(&request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Server configuration error");
    }
}
