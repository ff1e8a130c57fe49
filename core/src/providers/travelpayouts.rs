use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use serde::Deserialize;

use super::{upstream_failure, FlightProvider};
use crate::airlines::airline_name;
use crate::booking::{aviasales_search_link, with_marker};
use crate::config::TravelpayoutsConfig;
use crate::error::SearchError;
use crate::offer::{format_minutes, FlightEndpoint, FlightOffer};
use crate::request::{SearchRequest, TripType};

const PRICES_PATH: &str = "/aviasales/v3/prices_for_dates";

/// Cached-price search against the Travelpayouts data API. Results carry an
/// affiliate booking link instead of a bookable offer.
pub struct TravelpayoutsProvider {
    client: reqwest::Client,
    config: TravelpayoutsConfig,
    max_results: usize,
}

impl TravelpayoutsProvider {
    pub fn new(client: reqwest::Client, config: TravelpayoutsConfig, max_results: usize) -> Self {
        TravelpayoutsProvider { client, config, max_results }
    }
}

#[async_trait]
impl FlightProvider for TravelpayoutsProvider {
    fn name(&self) -> &'static str {
        "travelpayouts"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError> {
        let mut query: Vec<(&str, String)> = vec![
            ("origin", request.origin.clone()),
            ("destination", request.destination.clone()),
            ("departure_at", request.departure_date.format("%Y-%m-%d").to_string()),
            ("one_way", (request.trip_type == TripType::OneWay).to_string()),
            ("currency", "usd".to_string()),
            ("sorting", "price".to_string()),
            ("limit", self.max_results.to_string()),
            ("token", self.config.token.clone()),
        ];
        if let Some(ret) = request.return_date {
            query.push(("return_at", ret.format("%Y-%m-%d").to_string()));
        }

        tracing::debug!(origin = %request.origin, destination = %request.destination, "querying travelpayouts");

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), PRICES_PATH);
        let res = self.client.get(url).query(&query).send().await?;

        if !res.status().is_success() {
            return Err(upstream_failure(res).await);
        }

        let body = res.json::<serde_json::Value>().await?;
        let body: PricesResponse = serde_json::from_value(body)?;
        if !body.success {
            let detail = body.error.unwrap_or_else(|| "Search failed".to_string());
            tracing::error!(error = %detail, "travelpayouts reported failure");
            return Err(SearchError::UpstreamRejected(detail));
        }

        let currency = body.currency.unwrap_or_else(|| "usd".to_string()).to_uppercase();
        Ok(map_prices(
            body.data,
            &currency,
            &self.config.marker,
            request,
            self.max_results,
        ))
    }
}

/// Entries are decoded one at a time; a bad one is logged and dropped.
fn map_prices(
    data: Vec<serde_json::Value>,
    currency: &str,
    marker: &str,
    request: &SearchRequest,
    max_results: usize,
) -> Vec<FlightOffer> {
    data.into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let mapped = serde_json::from_value::<PriceEntry>(raw)
                .map_err(SearchError::from)
                .and_then(|price| map_price(price, currency, marker, request));
            match mapped {
                Ok(offer) => Some(offer),
                Err(e) => {
                    tracing::warn!(entry = i, "skipping price: {e}");
                    None
                }
            }
        })
        .take(max_results)
        .collect()
}

fn map_price(
    price: PriceEntry,
    currency: &str,
    marker: &str,
    request: &SearchRequest,
) -> Result<FlightOffer, SearchError> {
    let departure_at = DateTime::parse_from_rfc3339(&price.departure_at)
        .map_err(|_| SearchError::Malformed(format!("departure_at {:?}", price.departure_at)))?;
    let minutes = price.duration_to.or(price.duration).unwrap_or(0);
    // only the outbound duration is known, so arrival is reported in the origin's offset
    let arrival_at = departure_at + Duration::minutes(i64::from(minutes));

    let booking_url = price
        .link
        .as_deref()
        .and_then(|link| with_marker(link, marker))
        .unwrap_or_else(|| aviasales_search_link(marker, request));

    Ok(FlightOffer {
        id: format!(
            "{}{}-{}",
            price.airline,
            price.flight_number,
            departure_at.format("%Y%m%d%H%M")
        ),
        airline: airline_name(&price.airline).to_string(),
        flight_number: format!("{} {}", price.airline, price.flight_number),
        departure: local_endpoint(price.origin_airport.unwrap_or(price.origin), departure_at),
        arrival: local_endpoint(price.destination_airport.unwrap_or(price.destination), arrival_at),
        duration: format_minutes(minutes),
        stops: price.transfers,
        price: price.price,
        currency: currency.to_string(),
        booking_url: Some(booking_url),
    })
}

fn local_endpoint(code: String, at: DateTime<FixedOffset>) -> FlightEndpoint {
    FlightEndpoint {
        code,
        time: at.format("%H:%M").to_string(),
        date: at.format("%Y-%m-%d").to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    success: bool,
    #[serde(default)]
    data: Vec<serde_json::Value>,
    currency: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    origin: String,
    destination: String,
    origin_airport: Option<String>,
    destination_airport: Option<String>,
    price: f64,
    airline: String,
    #[serde(deserialize_with = "flight_number")]
    flight_number: String,
    departure_at: String,
    #[serde(default)]
    transfers: u32,
    duration: Option<u32>,
    duration_to: Option<u32>,
    link: Option<String>,
}

// Travelpayouts sends flight numbers as either strings or integers.
fn flight_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
