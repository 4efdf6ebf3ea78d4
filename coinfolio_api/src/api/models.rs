use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use coinfolio_domain::analytics::{HoldingPerformance, PortfolioSummary, CoinComparison};
use coinfolio_domain::models::{CoinSummary, HistoryPoint, PriceSnapshot, SearchResult};

use crate::service::{CoinSource, CoinsPage, WatchlistItem};

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> ErrorResponse {
        ErrorResponse { error: error.into() }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

//

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
    pub api: &'static str,
    pub cache_entries: usize,
}

//

#[derive(Deserialize, Debug)]
pub struct CoinsPageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize)]
pub struct CoinsPageResponse {
    pub coins: Vec<CoinSummary>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub source: CoinSource,
}

impl From<CoinsPage> for CoinsPageResponse {
    fn from(x: CoinsPage) -> Self {
        CoinsPageResponse {
            coins: x.coins,
            total: x.total,
            page: x.page,
            per_page: x.per_page,
            source: x.source,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct PriceResponse {
    pub coin_id: String,

    #[serde(flatten)]
    pub snapshot: PriceSnapshot,
}

#[derive(Deserialize, Debug)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub coin_id: String,
    pub days: u32,
    pub data: Vec<HistoryPoint>,
}

//

#[derive(Serialize)]
pub struct PortfolioResponse {
    pub portfolio: Vec<HoldingPerformance>,
    pub summary: PortfolioSummary,
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub watchlist: Vec<WatchlistItem>,
}

#[derive(Serialize)]
pub struct PortfolioAnalyticsResponse {
    pub analytics: PortfolioSummary,
    pub holdings: Vec<HoldingPerformance>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub days: u32,
    pub coins: Vec<CoinComparison>,
}

//

#[derive(Deserialize, Debug)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct ExportResponse<T> {
    pub data: T,
    pub filename: String,
}
