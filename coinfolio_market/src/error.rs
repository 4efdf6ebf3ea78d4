use reqwest::StatusCode;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MarketError {
    #[snafu(display("Invalid query: {}", reason))]
    InvalidQuery { reason: String },

    #[snafu(display("No market data for '{}'", coin_id))]
    NoData { coin_id: String },

    #[snafu(display("Market data provider is rate limiting requests (gave up after {} attempts)", attempts))]
    RateLimited { attempts: u32 },

    #[snafu(display("Market data request failed: {}", source))]
    Http { source: reqwest::Error },

    #[snafu(display("Market data provider responded with {}", status))]
    Status { status: StatusCode },

    #[snafu(display("Failed to decode market data response: {}", source))]
    Decode { source: serde_json::Error },
}

impl MarketError {
    /// Worth retrying: throttling, timeouts and connection failures.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketError::Status { status } => *status == StatusCode::TOO_MANY_REQUESTS,
            MarketError::Http { source } => source.is_timeout() || source.is_connect(),
            _ => false,
        }
    }

    /// The provider could not be reached or did not answer usefully.
    pub fn is_unavailable(&self) -> bool {
        match self {
            MarketError::InvalidQuery { .. } | MarketError::NoData { .. } => false,
            _ => true,
        }
    }
}
