use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use futures::future::join_all;
use log::warn;

use coinfolio_domain::models::{PriceSnapshot, HistoryPoint, CoinSummary, SearchResult};

pub mod cache;
pub mod retry;
pub mod coingecko;
mod error;
mod client;
mod cached;

pub use error::MarketError;
pub use client::{CoinGeckoClient, RateIntervals, clamp_search_limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
pub use cached::CachedMarketData;
pub use cache::{PriceCache, Clock, SystemClock, ManualClock};
pub use retry::RetryPolicy;

pub const DEFAULT_MARKETS_ORDER: &str = "market_cap_desc";

/// Source of live market data, priced in USD.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn price(&self, coin_id: &str) -> Result<PriceSnapshot, MarketError>;

    /// Chronological points covering the last `days` days.
    async fn history(&self, coin_id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketError>;

    async fn markets(&self, page: u32, per_page: u32, order: &str) -> Result<Vec<CoinSummary>, MarketError>;

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, MarketError>;

    /// Whether the provider is reachable.
    async fn ping(&self) -> bool;

    /// Entries currently held in memory, if the implementation caches.
    fn cache_entries(&self) -> usize {
        0
    }
}

/// Looks up prices for every distinct id concurrently. Ids whose lookup
/// fails are logged and left out of the result.
pub async fn price_snapshots<M>(market: &M, coin_ids: &[String]) -> HashMap<String, PriceSnapshot>
    where M: MarketData + ?Sized
{
    let distinct: BTreeSet<&str> = coin_ids.iter().map(String::as_str).collect();

    let lookups = distinct.into_iter().map(|coin_id| async move {
        (coin_id, market.price(coin_id).await)
    });

    join_all(lookups).await
        .into_iter()
        .filter_map(|(coin_id, result)| match result {
            Ok(snapshot) => Some((coin_id.to_owned(), snapshot)),
            Err(err) => {
                warn!("No price for '{}': {}", coin_id, err);
                None
            }
        })
        .collect()
}
