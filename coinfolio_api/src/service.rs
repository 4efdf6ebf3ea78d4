//! Request-level operations combining the store with live market data.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::warn;
use serde::Serialize;
use sqlx::SqlitePool;

use coinfolio_data::StoreError;
use coinfolio_data::sqlite::ops::{holding, watchlist, coin_cache};
use coinfolio_domain::analytics::{self, PortfolioAnalytics, MarketOverview, Comparison, CoinComparison};
use coinfolio_domain::models::{CoinSummary, CachedCoinSummary, WatchlistEntry, clamp_per_page};
use coinfolio_market::{MarketData, price_snapshots, DEFAULT_MARKETS_ORDER};

use crate::error::ApiError;

/// Reported as `total` for live listings.
pub const LISTED_COINS_TOTAL: i64 = 500;

pub const MARKET_OVERVIEW_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug)]
pub struct CoinCachePolicy {
    pub max_age: Duration,
}

impl CoinCachePolicy {
    /// Oldest `last_updated` still considered fresh at `now`.
    pub fn fresh_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CoinSource {
    Cache,
    Api,
}

#[derive(Debug)]
pub struct CoinsPage {
    pub coins: Vec<CoinSummary>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub source: CoinSource,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WatchlistItem {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    pub current_price: Option<f64>,
    pub change_24h: Option<f64>,
    pub market_cap: Option<f64>,
}

pub async fn portfolio_analytics(pool: &SqlitePool, market: &dyn MarketData) -> Result<PortfolioAnalytics, ApiError> {
    let holdings = holding::list(pool).await?;

    let coin_ids: Vec<String> = holdings.iter().map(|h| h.coin_id.clone()).collect();
    let prices = price_snapshots(market, &coin_ids).await;

    Ok(analytics::analyze(holdings, &prices))
}

pub async fn watchlist_items(pool: &SqlitePool, market: &dyn MarketData) -> Result<Vec<WatchlistItem>, ApiError> {
    let entries = watchlist::list(pool).await?;

    let coin_ids: Vec<String> = entries.iter().map(|e| e.coin_id.clone()).collect();
    let prices = price_snapshots(market, &coin_ids).await;

    Ok(entries.into_iter()
        .map(|entry| {
            let price = prices.get(&entry.coin_id);
            WatchlistItem {
                current_price: price.map(|p| p.price),
                change_24h: price.and_then(|p| p.change_24h),
                market_cap: price.and_then(|p| p.market_cap),
                entry,
            }
        })
        .collect())
}

/// Serves a page from fresh `coin_cache` rows when the cache holds every
/// rank of the page, otherwise fetches it live and writes it back.
pub async fn coins_page(
    pool: &SqlitePool,
    market: &dyn MarketData,
    policy: &CoinCachePolicy,
    page: u32,
    per_page: u32)
    -> Result<CoinsPage, ApiError>
{
    let page = page.max(1);
    let per_page = clamp_per_page(per_page);
    let now = Utc::now();
    let fresh_since = policy.fresh_since(now);

    let first_rank = i64::from(page - 1) * i64::from(per_page) + 1;
    let last_rank = first_rank + i64::from(per_page) - 1;

    let cached = coin_cache::list_fresh_ranks(fresh_since, first_rank, last_rank, pool).await?;
    if covers_ranks(&cached, first_rank, per_page) {
        return cached_page(pool, cached, fresh_since, page, per_page).await;
    }

    match market.markets(page, per_page, DEFAULT_MARKETS_ORDER).await {
        Ok(coins) => {
            if let Err(err) = store_listing(pool, &coins, policy, now).await {
                warn!("Failed to refresh coin cache: {}", err);
            }

            Ok(CoinsPage {
                coins,
                total: LISTED_COINS_TOTAL,
                page,
                per_page,
                source: CoinSource::Api,
            })
        },
        Err(err) if !cached.is_empty() => {
            warn!("Serving partial page {} from coin cache. Cause: {}", page, err);
            cached_page(pool, cached, fresh_since, page, per_page).await
        },
        Err(err) => Err(err.into()),
    }
}

/// True when `rows` hold exactly the ranks `first_rank..first_rank + per_page`.
fn covers_ranks(rows: &[CachedCoinSummary], first_rank: i64, per_page: u32) -> bool {
    rows.len() == per_page as usize
        && rows.iter()
            .zip(first_rank..)
            .all(|(row, rank)| row.market_cap_rank == Some(rank))
}

async fn cached_page(
    pool: &SqlitePool,
    cached: Vec<CachedCoinSummary>,
    fresh_since: DateTime<Utc>,
    page: u32,
    per_page: u32)
    -> Result<CoinsPage, ApiError>
{
    let total = coin_cache::count_fresh(fresh_since, pool).await?;
    Ok(CoinsPage {
        coins: cached.into_iter().map(CoinSummary::from).collect(),
        total,
        page,
        per_page,
        source: CoinSource::Cache,
    })
}

/// Writes a live listing into `coin_cache`, purging rows past the policy age.
pub async fn store_listing(
    pool: &SqlitePool,
    coins: &[CoinSummary],
    policy: &CoinCachePolicy,
    now: DateTime<Utc>)
    -> Result<usize, StoreError>
{
    let rows: Vec<CachedCoinSummary> = coins.iter()
        .map(|coin| CachedCoinSummary::from_summary(coin, now))
        .collect();

    coin_cache::upsert_many(&rows, policy.fresh_since(now), pool).await
}

pub async fn market_overview(market: &dyn MarketData) -> Result<MarketOverview, ApiError> {
    let coins = market.markets(1, MARKET_OVERVIEW_SIZE, DEFAULT_MARKETS_ORDER).await?;
    Ok(analytics::overview(&coins))
}

/// Histories are fetched concurrently. A coin whose history cannot be
/// fetched is reported as unavailable rather than failing the comparison.
pub async fn compare(market: &dyn MarketData, comparison: &Comparison) -> Vec<CoinComparison> {
    let days = comparison.days;

    let lookups = comparison.coin_ids.iter().map(|coin_id| async move {
        let points = match market.history(coin_id, days).await {
            Ok(points) => Some(points),
            Err(err) => {
                warn!("No history for '{}' over {} days: {}", coin_id, days, err);
                None
            }
        };
        (coin_id.clone(), points)
    });

    analytics::compare(join_all(lookups).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coinfolio_data::sqlite::connect_in_memory;

    use crate::testing::FakeMarket;

    fn ids(page: &CoinsPage) -> Vec<&str> {
        page.coins.iter().map(|c| c.id.as_str()).collect()
    }

    fn hour() -> CoinCachePolicy {
        CoinCachePolicy { max_age: Duration::from_secs(3600) }
    }

    #[test]
    fn fresh_since_subtracts_max_age() {
        let policy = CoinCachePolicy { max_age: Duration::from_secs(3600) };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(policy.fresh_since(now), Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn fresh_since_saturates() {
        let policy = CoinCachePolicy { max_age: Duration::from_secs(u64::MAX) };
        assert_eq!(policy.fresh_since(Utc::now()), DateTime::<Utc>::MIN_UTC);
    }

    #[actix_web::test]
    async fn later_page_in_cache_does_not_answer_earlier_page() {
        let pool = connect_in_memory().await.unwrap();
        let market = FakeMarket::with_listing(10);

        let second = coins_page(&pool, &market, &hour(), 2, 5).await.unwrap();
        assert_eq!(second.source, CoinSource::Api);
        assert_eq!(ids(&second), vec!["coin5", "coin6", "coin7", "coin8", "coin9"]);

        let first = coins_page(&pool, &market, &hour(), 1, 5).await.unwrap();
        assert_eq!(first.source, CoinSource::Api);
        assert_eq!(ids(&first), vec!["coin0", "coin1", "coin2", "coin3", "coin4"]);

        let second = coins_page(&pool, &market, &hour(), 2, 5).await.unwrap();
        assert_eq!(second.source, CoinSource::Cache);
        assert_eq!(ids(&second), vec!["coin5", "coin6", "coin7", "coin8", "coin9"]);
        assert_eq!(second.total, 10);
    }

    #[actix_web::test]
    async fn outage_serves_only_rows_of_the_requested_page() {
        let pool = connect_in_memory().await.unwrap();

        coins_page(&pool, &FakeMarket::with_listing(7), &hour(), 2, 5).await.unwrap();

        let down = FakeMarket::with_listing(7).down();
        assert!(matches!(
            coins_page(&pool, &down, &hour(), 1, 5).await,
            Err(ApiError::UpstreamUnavailable { .. })));

        let partial = coins_page(&pool, &down, &hour(), 2, 5).await.unwrap();
        assert_eq!(partial.source, CoinSource::Cache);
        assert_eq!(ids(&partial), vec!["coin5", "coin6"]);
    }
}
