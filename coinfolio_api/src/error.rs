use snafu::Snafu;

use coinfolio_data::StoreError;
use coinfolio_domain::models::ValidationError;
use coinfolio_market::MarketError;

use crate::export::ExportError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("{}", source))]
    Validation { source: ValidationError },

    #[snafu(display("{}", message))]
    BadRequest { message: String },

    #[snafu(display("{}", message))]
    NotFound { message: String },

    #[snafu(display("{}", message))]
    Conflict { message: String },

    #[snafu(display("Market data is currently unavailable"))]
    UpstreamUnavailable { source: MarketError },

    #[snafu(display("Internal storage error"))]
    Storage { source: StoreError },

    #[snafu(display("Failed to export portfolio"))]
    Export { source: ExportError },
}

impl From<ValidationError> for ApiError {
    fn from(source: ValidationError) -> Self {
        ApiError::Validation { source }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound { message: err.to_string() },
            StoreError::Conflict { .. } => ApiError::Conflict { message: err.to_string() },
            StoreError::Sql { .. } => ApiError::Storage { source: err },
        }
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::InvalidQuery { .. } => ApiError::BadRequest { message: err.to_string() },
            MarketError::NoData { .. } => ApiError::NotFound { message: err.to_string() },
            source => ApiError::UpstreamUnavailable { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_kind() {
        let err = ApiError::from(StoreError::NotFound { entity: "Holding", key: "7".into() });
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.to_string(), "Holding '7' not found");

        let err = ApiError::from(StoreError::Conflict { entity: "Watchlist entry", key: "bitcoin".into() });
        assert!(matches!(err, ApiError::Conflict { .. }));
    }

    #[test]
    fn market_errors_map_to_caller_or_upstream() {
        assert!(matches!(
            ApiError::from(MarketError::InvalidQuery { reason: "blank".into() }),
            ApiError::BadRequest { .. }));
        assert!(matches!(
            ApiError::from(MarketError::NoData { coin_id: "ghost".into() }),
            ApiError::NotFound { .. }));
        assert!(matches!(
            ApiError::from(MarketError::RateLimited { attempts: 3 }),
            ApiError::UpstreamUnavailable { .. }));
    }
}
