use std::sync::Arc;

use flight_core::config::DEFAULT_MAX_RESULTS;
use flight_core::{build_provider, search_flights, Config, FlightProvider, SearchParams, UnconfiguredProvider};
use lambda_http::{run, service_fn, tracing, Body, Error, Request, RequestExt, Response};

async fn function_handler(
    provider: &dyn FlightProvider,
    max_results: usize,
    event: Request,
) -> Result<Response<Body>, Error> {
    let query = event.query_string_parameters();
    let params = SearchParams::from_lookup(|key| query.first(key).map(str::to_string));

    let response = search_flights(provider, event.method(), &params, max_results).await;
    Ok(response.map(Body::from))
}

/// Misconfiguration is reported per request as a 500 rather than failing the
/// cold start, so clients still get CORS headers and a JSON body.
fn init_provider() -> (Arc<dyn FlightProvider>, usize) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return (Arc::new(UnconfiguredProvider::new(e.to_string())), DEFAULT_MAX_RESULTS);
        }
    };

    match build_provider(&config) {
        Ok(provider) => (provider, config.max_results),
        Err(e) => {
            tracing::error!("failed to build provider: {e}");
            (Arc::new(UnconfiguredProvider::new(e.to_string())), DEFAULT_MAX_RESULTS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let (provider, max_results) = init_provider();
    let provider = provider.as_ref();

    run(service_fn(move |event: Request| async move {
        function_handler(provider, max_results, event).await
    }))
    .await
}
