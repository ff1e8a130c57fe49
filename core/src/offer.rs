use serde::Serialize;

/// One side of a flight: where and when, in the airport's local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightEndpoint {
    pub code: String,
    pub time: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub airline: String,
    pub flight_number: String,
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    pub duration: String,
    pub stops: u32,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Success {
        success: bool,
        flights: Vec<FlightOffer>,
        count: usize,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl SearchResponse {
    pub fn ok(flights: Vec<FlightOffer>) -> Self {
        SearchResponse::Success {
            success: true,
            count: flights.len(),
            flights,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SearchResponse::Failure {
            success: false,
            error: message.into(),
        }
    }
}

/// `PT7H30M` -> `7h30m`
pub fn format_iso_duration(iso: &str) -> String {
    iso.trim_start_matches("PT").to_lowercase()
}

/// `450` -> `7h30m`
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}
