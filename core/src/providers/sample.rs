use async_trait::async_trait;
use chrono::Days;

use super::FlightProvider;
use crate::airlines::airline_name;
use crate::booking::aviasales_search_link;
use crate::error::SearchError;
use crate::offer::{FlightEndpoint, FlightOffer};
use crate::request::SearchRequest;

struct CannedFlight {
    carrier: &'static str,
    number: &'static str,
    departs: &'static str,
    arrives: &'static str,
    // days between departure and arrival date
    overnight: u64,
    duration: &'static str,
    stops: u32,
    price: f64,
}

const DAC_LHR: &[CannedFlight] = &[
    CannedFlight {
        carrier: "BG",
        number: "101",
        departs: "10:30",
        arrives: "16:15",
        overnight: 0,
        duration: "11h45m",
        stops: 0,
        price: 845.0,
    },
    CannedFlight {
        carrier: "EK",
        number: "586",
        departs: "21:55",
        arrives: "07:40",
        overnight: 1,
        duration: "15h45m",
        stops: 1,
        price: 925.0,
    },
];

const ANY_ROUTE: &[CannedFlight] = &[
    CannedFlight {
        carrier: "BA",
        number: "178",
        departs: "08:15",
        arrives: "14:40",
        overnight: 0,
        duration: "6h25m",
        stops: 0,
        price: 450.0,
    },
    CannedFlight {
        carrier: "QR",
        number: "12",
        departs: "19:20",
        arrives: "09:05",
        overnight: 1,
        duration: "13h45m",
        stops: 1,
        price: 520.0,
    },
];

/// Fixed offers for demos and local development. No network access.
pub struct SampleProvider {
    marker: Option<String>,
}

impl SampleProvider {
    pub fn new(marker: Option<String>) -> Self {
        SampleProvider { marker }
    }
}

#[async_trait]
impl FlightProvider for SampleProvider {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, SearchError> {
        let flights = match (request.origin.as_str(), request.destination.as_str()) {
            ("DAC", "LHR") => DAC_LHR,
            _ => ANY_ROUTE,
        };

        let booking_url = self
            .marker
            .as_deref()
            .map(|marker| aviasales_search_link(marker, request));

        flights
            .iter()
            .map(|flight| -> Result<FlightOffer, SearchError> {
                let arrival_date = request
                    .departure_date
                    .checked_add_days(Days::new(flight.overnight))
                    .ok_or_else(|| SearchError::invalid("date", "out of range"))?;

                Ok(FlightOffer {
                    id: format!("{}{}", flight.carrier, flight.number),
                    airline: airline_name(flight.carrier).to_string(),
                    flight_number: format!("{} {}", flight.carrier, flight.number),
                    departure: FlightEndpoint {
                        code: request.origin.clone(),
                        time: flight.departs.to_string(),
                        date: request.departure_date.format("%Y-%m-%d").to_string(),
                    },
                    arrival: FlightEndpoint {
                        code: request.destination.clone(),
                        time: flight.arrives.to_string(),
                        date: arrival_date.format("%Y-%m-%d").to_string(),
                    },
                    duration: flight.duration.to_string(),
                    stops: flight.stops,
                    price: flight.price,
                    currency: "USD".to_string(),
                    booking_url: booking_url.clone(),
                })
            })
            .collect()
    }
}
