use http::{header, Method, Response, StatusCode};

use crate::error::SearchError;
use crate::offer::SearchResponse;
use crate::providers::FlightProvider;
use crate::request::SearchParams;

pub const ALLOWED_METHODS: &str = "GET,OPTIONS";
pub const ALLOWED_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Handles one `/api/search-flights` call end to end.
///
/// `OPTIONS` short-circuits with an empty 200. Every response carries the
/// CORS headers, including errors.
pub async fn search_flights(
    provider: &dyn FlightProvider,
    method: &Method,
    params: &SearchParams,
    max_results: usize,
) -> Response<String> {
    if method == Method::OPTIONS {
        return cors_response(StatusCode::OK, String::new(), false);
    }
    if method != Method::GET {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &SearchResponse::error("Method not allowed"),
        );
    }

    match run_search(provider, params, max_results).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(err) => error_response(provider.name(), &err),
    }
}

async fn run_search(
    provider: &dyn FlightProvider,
    params: &SearchParams,
    max_results: usize,
) -> Result<SearchResponse, SearchError> {
    let request = params.validate()?;
    tracing::info!(
        provider = provider.name(),
        origin = %request.origin,
        destination = %request.destination,
        date = %request.departure_date,
        travelers = request.travelers,
        "searching flights"
    );

    let mut flights = provider.search(&request).await?;
    flights.truncate(max_results);

    tracing::info!(count = flights.len(), "search complete");
    Ok(SearchResponse::ok(flights))
}

pub fn error_response(provider: &str, err: &SearchError) -> Response<String> {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(provider, %status, "flight search error: {err}");
    } else {
        tracing::warn!(provider, %status, "flight search rejected: {err}");
    }
    json_response(status, &SearchResponse::error(err.public_message()))
}

fn json_response(status: StatusCode, body: &SearchResponse) -> Response<String> {
    let body = match serde_json::to_string(body) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("failed to serialize response: {e}");
            return cors_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"success":false,"error":"Failed to search for flights"}"#.to_string(),
                true,
            );
        }
    };
    cors_response(status, body, true)
}

fn cors_response(status: StatusCode, body: String, json: bool) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        header::HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static(ALLOWED_HEADERS),
    );
    if json {
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::FlightOffer;
    use crate::providers::SampleProvider;
    use crate::request::SearchRequest;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Failing(fn() -> SearchError);

    #[async_trait]
    impl FlightProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError> {
            Err((self.0)())
        }
    }

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        SearchParams::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    fn body(response: &Response<String>) -> Value {
        serde_json::from_str(response.body()).unwrap()
    }

    fn assert_cors(response: &Response<String>) {
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOWED_HEADERS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    const DAC_LHR: &[(&str, &str)] = &[("from", "DAC"), ("to", "LHR"), ("date", "2024-03-15")];

    #[tokio::test]
    async fn test_options_is_empty_200() {
        let provider = Failing(|| SearchError::RateLimited);
        let response = search_flights(&provider, &Method::OPTIONS, &params(&[]), 10).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
        assert_cors(&response);
    }

    #[tokio::test]
    async fn test_missing_parameters_is_400() {
        let provider = SampleProvider::new(None);
        for pairs in [
            &[("to", "LHR"), ("date", "2024-03-15")][..],
            &[("from", "DAC"), ("date", "2024-03-15")][..],
            &[("from", "DAC"), ("to", "LHR")][..],
        ] {
            let response = search_flights(&provider, &Method::GET, &params(pairs), 10).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_cors(&response);

            let body = body(&response);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("Missing required parameters"));
        }
    }

    #[tokio::test]
    async fn test_sample_search() {
        let provider = SampleProvider::new(None);
        let response = search_flights(&provider, &Method::GET, &params(DAC_LHR), 10).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_cors(&response);

        let body = body(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        let flights = body["flights"].as_array().unwrap();
        assert_eq!(flights[0]["id"], "BG101");
        assert_eq!(flights[0]["price"], 845.0);
        assert_eq!(flights[0]["stops"], 0);
        assert_eq!(flights[1]["id"], "EK586");
        assert_eq!(flights[1]["price"], 925.0);
        assert_eq!(flights[1]["stops"], 1);
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let provider = SampleProvider::new(None);
        let response = search_flights(&provider, &Method::GET, &params(DAC_LHR), 1).await;

        let body = body(&response);
        assert_eq!(body["count"], 1);
        assert_eq!(body["flights"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let cases: [(fn() -> SearchError, StatusCode, &str); 5] = [
            (|| SearchError::AuthenticationFailed, StatusCode::INTERNAL_SERVER_ERROR, "API authentication failed"),
            (|| SearchError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            (|| SearchError::UpstreamRejected("No fares".into()), StatusCode::BAD_REQUEST, "No fares"),
            (|| SearchError::Configuration("AMADEUS_API_KEY".into()), StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error"),
            (|| SearchError::Upstream(StatusCode::BAD_GATEWAY), StatusCode::INTERNAL_SERVER_ERROR, "Failed to search for flights"),
        ];

        for (make, status, message) in cases {
            let provider = Failing(make);
            let response = search_flights(&provider, &Method::GET, &params(DAC_LHR), 10).await;

            assert_eq!(response.status(), status);
            assert_cors(&response);
            let body = body(&response);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let provider = SampleProvider::new(None);
        let response = search_flights(&provider, &Method::POST, &params(DAC_LHR), 10).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&response);
    }
}
