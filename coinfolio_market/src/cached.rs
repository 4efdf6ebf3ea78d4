use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use coinfolio_domain::models::{PriceSnapshot, HistoryPoint, CoinSummary, SearchResult};

use crate::{MarketData, clamp_search_limit};
use crate::cache::{PriceCache, Clock, SystemClock};
use crate::error::MarketError;

/// Wraps a `MarketData` source with one TTL cache per operation.
pub struct CachedMarketData<M> {
    inner: M,
    prices: PriceCache<PriceSnapshot>,
    histories: PriceCache<Vec<HistoryPoint>>,
    markets: PriceCache<Vec<CoinSummary>>,
    searches: PriceCache<Vec<SearchResult>>,
}

impl<M: MarketData> CachedMarketData<M> {
    pub fn new(inner: M, ttl: Duration) -> CachedMarketData<M> {
        CachedMarketData::with_clock(inner, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: M, ttl: Duration, clock: Arc<dyn Clock>) -> CachedMarketData<M> {
        CachedMarketData {
            inner,
            prices: PriceCache::with_clock(ttl, clock.clone()),
            histories: PriceCache::with_clock(ttl, clock.clone()),
            markets: PriceCache::with_clock(ttl, clock.clone()),
            searches: PriceCache::with_clock(ttl, clock),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: MarketData> MarketData for CachedMarketData<M> {
    async fn price(&self, coin_id: &str) -> Result<PriceSnapshot, MarketError> {
        let key = format!("price_{}", coin_id);
        self.prices.get_or_fetch(&key, || self.inner.price(coin_id)).await
    }

    async fn history(&self, coin_id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketError> {
        let key = format!("history_{}_{}", coin_id, days);
        self.histories.get_or_fetch(&key, || self.inner.history(coin_id, days)).await
    }

    async fn markets(&self, page: u32, per_page: u32, order: &str) -> Result<Vec<CoinSummary>, MarketError> {
        let key = format!("coins_list_{}_{}_{}", page, per_page, order);
        self.markets.get_or_fetch(&key, || self.inner.markets(page, per_page, order)).await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, MarketError> {
        let query = query.trim();
        let limit = clamp_search_limit(limit);
        let key = format!("search_{}_{}", query, limit);
        self.searches.get_or_fetch(&key, || self.inner.search(query, limit)).await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }

    fn cache_entries(&self) -> usize {
        self.prices.len() + self.histories.len() + self.markets.len() + self.searches.len()
    }
}
