use http::StatusCode;

pub const MISSING_PARAMETERS: &str = "Missing required parameters: from, to, date";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Missing required parameters: from, to, date")]
    MissingParameters,
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Server configuration error: {0}")]
    Configuration(String),
    #[error("API authentication failed")]
    AuthenticationFailed,
    #[error("Too many requests")]
    RateLimited,
    #[error("Upstream rejected search: {0}")]
    UpstreamRejected(String),
    #[error("Upstream responded with {0}")]
    Upstream(StatusCode),
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
    #[error("Malformed upstream offer: {0}")]
    Malformed(String),
}

impl SearchError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SearchError::InvalidParameter { name, reason: reason.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::MissingParameters
            | SearchError::InvalidParameter { .. }
            | SearchError::UpstreamRejected(_) => StatusCode::BAD_REQUEST,
            SearchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SearchError::Configuration(_)
            | SearchError::AuthenticationFailed
            | SearchError::Upstream(_)
            | SearchError::Http(_)
            | SearchError::Decode(_)
            | SearchError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            SearchError::MissingParameters => MISSING_PARAMETERS.to_string(),
            SearchError::InvalidParameter { .. } => self.to_string(),
            SearchError::Configuration(_) => "Server configuration error".to_string(),
            SearchError::AuthenticationFailed => "API authentication failed".to_string(),
            SearchError::RateLimited => "Too many requests".to_string(),
            SearchError::UpstreamRejected(detail) => detail.clone(),
            SearchError::Upstream(_)
            | SearchError::Http(_)
            | SearchError::Decode(_)
            | SearchError::Malformed(_) => "Failed to search for flights".to_string(),
        }
    }
}
