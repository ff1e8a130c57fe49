use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query},
    http::Method,
    response::{IntoResponse, Response},
    routing::any,
    Extension, Router,
};
use flight_core::{
    build_provider, handler::error_response, search_flights, Config, ConfigError, FlightProvider,
    SearchError, SearchParams,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("provider setup: {0}")]
    Provider(#[from] SearchError),
    #[error("invalid PORT {0:?}")]
    Port(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn FlightProvider>,
    max_results: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_search=debug,flight_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // credentials are checked here, before the first request
    let config = Config::from_env()?;
    let provider = build_provider(&config)?;

    let port = match std::env::var("PORT") {
        Ok(value) => value.parse::<u16>().map_err(|_| Error::Port(value))?,
        Err(_) => DEFAULT_PORT,
    };

    let router = app(AppState {
        provider,
        max_results: config.max_results,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/search-flights", any(search))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

async fn search(
    Extension(state): Extension<AppState>,
    method: Method,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(params)) => {
            search_flights(state.provider.as_ref(), &method, &params, state.max_results)
                .await
                .into_response()
        }
        Err(rejection) => error_response(
            state.provider.name(),
            &SearchError::invalid("query", rejection.body_text()),
        )
        .into_response(),
    }
}
