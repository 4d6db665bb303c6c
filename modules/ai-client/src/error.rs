use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// The service rejected the request with HTTP 429. Callers that retry
    /// should wait longer for this variant than for other failures.
    #[error("rate limited by API: {0}")]
    RateLimited(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("empty response from API")]
    EmptyResponse,

    #[error("invalid API key")]
    InvalidKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl AiError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AiError::RateLimited(_))
    }
}
