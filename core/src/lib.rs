//! Flight search proxy.
//!
//! Validates an inbound search, asks the configured upstream provider
//! (Amadeus, Travelpayouts or canned sample data) for offers and reshapes
//! them into one simplified JSON schema. The server binary and the
//! serverless function in `lambdas/` are thin wrappers around
//! [`handler::search_flights`].

pub mod airlines;
pub mod booking;
pub mod config;
pub mod error;
pub mod handler;
pub mod offer;
pub mod providers;
pub mod request;

pub use config::{Config, ConfigError};
pub use error::SearchError;
pub use handler::search_flights;
pub use offer::{FlightEndpoint, FlightOffer, SearchResponse};
pub use providers::{build_provider, FlightProvider, UnconfiguredProvider};
pub use request::{SearchParams, SearchRequest, TripType};
