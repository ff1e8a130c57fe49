use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::SearchError;

pub const MAX_TRAVELERS: u32 = 9;
pub const MAX_CHILDREN: u32 = 8;

/// Raw query parameters exactly as the client sent them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub travelers: Option<String>,
    pub trip_type: Option<String>,
    pub return_date: Option<String>,
    pub children: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    OneWay,
    Return,
}

/// A validated search. Airport codes are normalized IATA-style codes.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub travelers: u32,
    pub children: u32,
    pub trip_type: TripType,
}

impl SearchParams {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        SearchParams {
            from: lookup("from"),
            to: lookup("to"),
            date: lookup("date"),
            travelers: lookup("travelers"),
            trip_type: lookup("tripType"),
            return_date: lookup("returnDate"),
            children: lookup("children"),
        }
    }

    pub fn validate(&self) -> Result<SearchRequest, SearchError> {
        let (from, to, date) = match (present(&self.from), present(&self.to), present(&self.date)) {
            (Some(from), Some(to), Some(date)) => (from, to, date),
            _ => return Err(SearchError::MissingParameters),
        };

        let origin = normalize_airport_code(from)
            .ok_or_else(|| SearchError::invalid("from", format!("{from:?} is not an airport")))?;
        let destination = normalize_airport_code(to)
            .ok_or_else(|| SearchError::invalid("to", format!("{to:?} is not an airport")))?;
        let departure_date = parse_date("date", date)?;

        let travelers = parse_count("travelers", present(&self.travelers), 1, 1, MAX_TRAVELERS)?;
        let children = parse_count("children", present(&self.children), 0, 0, MAX_CHILDREN)?;

        let return_date = present(&self.return_date)
            .map(|d| parse_date("returnDate", d))
            .transpose()?;

        let trip_type = match present(&self.trip_type).map(str::to_ascii_lowercase).as_deref() {
            Some("oneway") | Some("one-way") => TripType::OneWay,
            Some("return") | Some("roundtrip") => TripType::Return,
            Some(other) => {
                return Err(SearchError::invalid(
                    "tripType",
                    format!("{other:?}, expected oneway or return"),
                ))
            }
            None if return_date.is_some() => TripType::Return,
            None => TripType::OneWay,
        };

        let return_date = match trip_type {
            TripType::OneWay => None,
            TripType::Return => {
                let ret = return_date
                    .ok_or_else(|| SearchError::invalid("returnDate", "required for return trips"))?;
                if ret < departure_date {
                    return Err(SearchError::invalid("returnDate", "must not be before date"));
                }
                Some(ret)
            }
        };

        Ok(SearchRequest {
            origin,
            destination,
            departure_date,
            return_date,
            travelers,
            children,
            trip_type,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| SearchError::invalid(name, format!("{value:?} is not a YYYY-MM-DD date")))
}

fn parse_count(
    name: &'static str,
    value: Option<&str>,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, SearchError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<u32>() {
        Ok(n) if (min..=max).contains(&n) => Ok(n),
        _ => Err(SearchError::invalid(
            name,
            format!("{value:?} must be a number between {min} and {max}"),
        )),
    }
}

/// Pulls a three letter airport code out of free text.
///
/// `"Dhaka (DAC)"` and `"dac"` both give `DAC`. Anything else falls back to
/// the first three letters, so `"London"` becomes `LON`.
pub fn normalize_airport_code(input: &str) -> Option<String> {
    let input = input.trim();

    if let (Some(open), Some(close)) = (input.rfind('('), input.rfind(')')) {
        if open < close {
            let inner = input[open + 1..close].trim();
            if is_code(inner) {
                return Some(inner.to_ascii_uppercase());
            }
        }
    }

    if is_code(input) {
        return Some(input.to_ascii_uppercase());
    }

    let letters: String = input
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect();
    (letters.len() == 3).then(|| letters.to_ascii_uppercase())
}

fn is_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())
}
