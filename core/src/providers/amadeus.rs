use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{endpoint, upstream_failure, FlightProvider};
use crate::airlines::{airline_name, is_known_carrier};
use crate::config::AmadeusConfig;
use crate::error::SearchError;
use crate::offer::{format_iso_duration, FlightOffer};
use crate::request::SearchRequest;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Amadeus Self-Service flight offers search. Each search exchanges the client
/// credentials for a fresh bearer token first.
pub struct AmadeusProvider {
    client: reqwest::Client,
    config: AmadeusConfig,
    max_results: usize,
}

impl AmadeusProvider {
    pub fn new(client: reqwest::Client, config: AmadeusConfig, max_results: usize) -> Self {
        AmadeusProvider { client, config, max_results }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String, SearchError> {
        let res = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.api_secret.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            // a rejected credential exchange is an auth failure whatever the status
            let err = upstream_failure(res).await;
            return Err(match err {
                SearchError::RateLimited => SearchError::RateLimited,
                SearchError::UpstreamRejected(_) | SearchError::AuthenticationFailed => {
                    SearchError::AuthenticationFailed
                }
                other => other,
            });
        }

        let token: TokenResponse = res.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl FlightProvider for AmadeusProvider {
    fn name(&self) -> &'static str {
        "amadeus"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError> {
        let token = self.access_token().await?;

        let mut query: Vec<(&str, String)> = vec![
            ("originLocationCode", request.origin.clone()),
            ("destinationLocationCode", request.destination.clone()),
            ("departureDate", request.departure_date.format("%Y-%m-%d").to_string()),
            ("adults", request.travelers.to_string()),
            ("currencyCode", "USD".to_string()),
            ("max", self.max_results.to_string()),
        ];
        if let Some(ret) = request.return_date {
            query.push(("returnDate", ret.format("%Y-%m-%d").to_string()));
        }
        if request.children > 0 {
            query.push(("children", request.children.to_string()));
        }

        tracing::debug!(origin = %request.origin, destination = %request.destination, "querying amadeus");

        let res = self
            .client
            .get(self.url(OFFERS_PATH))
            .query(&query)
            .bearer_auth(token)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(upstream_failure(res).await);
        }

        let body = res.json::<serde_json::Value>().await?;
        let body: OffersResponse = serde_json::from_value(body)?;
        Ok(map_offers(body, self.max_results))
    }
}

pub(crate) fn map_offers(body: OffersResponse, max_results: usize) -> Vec<FlightOffer> {
    let carriers = body.dictionaries.map(|d| d.carriers).unwrap_or_default();

    // entries are decoded one by one so a single bad offer is dropped alone
    body.data
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let id = raw
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{i}"));
            match map_offer(raw, &carriers) {
                Ok(mapped) => Some(mapped),
                Err(e) => {
                    tracing::warn!(offer = %id, "skipping offer: {e}");
                    None
                }
            }
        })
        .take(max_results)
        .collect()
}

fn map_offer(
    raw: serde_json::Value,
    carriers: &HashMap<String, String>,
) -> Result<FlightOffer, SearchError> {
    let offer: Offer = serde_json::from_value(raw)?;
    let itinerary = offer
        .itineraries
        .first()
        .ok_or_else(|| SearchError::Malformed("offer has no itineraries".into()))?;
    let (first, last) = match (itinerary.segments.first(), itinerary.segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::Malformed("itinerary has no segments".into())),
    };

    let price = offer
        .price
        .total
        .parse::<f64>()
        .map_err(|_| SearchError::Malformed(format!("price {:?}", offer.price.total)))?;

    let airline = if is_known_carrier(&first.carrier_code) {
        airline_name(&first.carrier_code).to_string()
    } else {
        carriers
            .get(&first.carrier_code)
            .cloned()
            .unwrap_or_else(|| first.carrier_code.clone())
    };

    Ok(FlightOffer {
        id: offer.id,
        airline,
        flight_number: format!("{} {}", first.carrier_code, first.number),
        departure: endpoint(&first.departure.iata_code, &first.departure.at)?,
        arrival: endpoint(&last.arrival.iata_code, &last.arrival.at)?,
        duration: itinerary
            .duration
            .as_deref()
            .map(format_iso_duration)
            .unwrap_or_default(),
        stops: itinerary.segments.len().saturating_sub(1) as u32,
        price,
        currency: offer.price.currency,
        booking_url: None,
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OffersResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    dictionaries: Option<Dictionaries>,
}

#[derive(Debug, Deserialize)]
struct Dictionaries {
    #[serde(default)]
    carriers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    id: String,
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    price: Price,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    duration: Option<String>,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    departure: SegmentPoint,
    arrival: SegmentPoint,
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentPoint {
    iata_code: String,
    at: String,
}

#[derive(Debug, Deserialize)]
struct Price {
    total: String,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}
