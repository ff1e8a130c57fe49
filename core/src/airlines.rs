/// Display name for an IATA carrier code. Unknown codes come back unchanged.
pub fn airline_name(code: &str) -> &str {
    match code {
        "AA" => "American Airlines",
        "DL" => "Delta Air Lines",
        "UA" => "United Airlines",
        "BA" => "British Airways",
        "LH" => "Lufthansa",
        "AF" => "Air France",
        "KL" => "KLM",
        "EY" => "Etihad Airways",
        "EK" => "Emirates",
        "QR" => "Qatar Airways",
        "BG" => "Biman Bangladesh Airlines",
        "TK" => "Turkish Airlines",
        "SQ" => "Singapore Airlines",
        _ => code,
    }
}

pub fn is_known_carrier(code: &str) -> bool {
    airline_name(code) != code
}
