use reqwest::Url;

use crate::request::SearchRequest;

pub const AVIASALES_BASE_URL: &str = "https://www.aviasales.com";

/// Affiliate deep link into the Aviasales search page for this request,
/// e.g. `/search/DAC1503LHR1?marker=12345`.
pub fn aviasales_search_link(marker: &str, request: &SearchRequest) -> String {
    let mut path = format!(
        "{}{}{}",
        request.origin,
        request.departure_date.format("%d%m"),
        request.destination
    );
    if let Some(ret) = request.return_date {
        path.push_str(&ret.format("%d%m").to_string());
    }
    path.push_str(&(request.travelers + request.children).to_string());

    let mut url = format!("{AVIASALES_BASE_URL}/search/{path}");
    if let Ok(mut parsed) = Url::parse(&url) {
        parsed.query_pairs_mut().append_pair("marker", marker);
        url = parsed.into();
    }
    url
}

/// Attaches the affiliate marker to a link returned by the upstream. Relative
/// links are resolved against the Aviasales site.
pub fn with_marker(link: &str, marker: &str) -> Option<String> {
    let base = Url::parse(AVIASALES_BASE_URL).ok()?;
    let mut url = base.join(link).ok()?;
    url.query_pairs_mut().append_pair("marker", marker);
    Some(url.into())
}
