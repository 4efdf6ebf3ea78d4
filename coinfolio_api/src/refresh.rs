use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn, error};
use snafu::{Snafu, ResultExt};
use sqlx::SqlitePool;

use coinfolio_data::StoreError;
use coinfolio_domain::models::MAX_MARKETS_PER_PAGE;
use coinfolio_market::{MarketData, MarketError, DEFAULT_MARKETS_ORDER};

use crate::service::{self, CoinCachePolicy};

pub const DEFAULT_REFRESH_PAGES: u32 = 2;

#[derive(Debug, Snafu)]
pub enum RefreshError {
    #[snafu(display("Failed to fetch market listing: {}", source))]
    Fetch { source: MarketError },

    #[snafu(display("Failed to store market listing: {}", source))]
    Store { source: StoreError },
}

/// Periodically copies the top of the market listing into `coin_cache`.
pub struct CoinCacheRefresher {
    pool: SqlitePool,
    market: Arc<dyn MarketData>,
    policy: CoinCachePolicy,
    interval: Duration,
    pages: u32,
}

impl CoinCacheRefresher {
    pub fn new(
        pool: SqlitePool,
        market: Arc<dyn MarketData>,
        policy: CoinCachePolicy,
        interval: Duration)
        -> CoinCacheRefresher
    {
        CoinCacheRefresher {
            pool,
            market,
            policy,
            interval,
            pages: DEFAULT_REFRESH_PAGES,
        }
    }

    /// Fetches every page first and only then writes, so no transaction is
    /// open while waiting on the provider.
    pub async fn refresh_once(&self) -> Result<usize, RefreshError> {
        let mut coins = Vec::new();

        for page in 1..=self.pages {
            match self.market.markets(page, MAX_MARKETS_PER_PAGE, DEFAULT_MARKETS_ORDER).await {
                Ok(mut batch) => {
                    let last_page = batch.len() < MAX_MARKETS_PER_PAGE as usize;
                    coins.append(&mut batch);
                    if last_page {
                        break;
                    }
                },
                Err(source) if coins.is_empty() => return Err(RefreshError::Fetch { source }),
                Err(err) => {
                    warn!("Stopping refresh at page {}: {}", page, err);
                    break;
                },
            }
        }

        service::store_listing(&self.pool, &coins, &self.policy, Utc::now())
            .await
            .context(StoreSnafu)
    }

    pub async fn into_run(self) {
        info!("Started coin cache refresh (interval = {:?}, pages = {})", self.interval, self.pages);

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;

            match self.refresh_once().await {
                Ok(count) => info!("Refreshed {} cached coins", count),
                Err(e) => error!("Coin cache refresh failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinfolio_data::sqlite::{connect_in_memory, ops::coin_cache};
    use crate::testing::FakeMarket;

    fn policy() -> CoinCachePolicy {
        CoinCachePolicy { max_age: Duration::from_secs(3600) }
    }

    #[actix_web::test]
    async fn refresh_writes_listing_into_cache() {
        let pool = connect_in_memory().await.unwrap();
        let market = Arc::new(FakeMarket::with_listing(3));
        let refresher = CoinCacheRefresher::new(pool.clone(), market, policy(), Duration::from_secs(60));

        assert_eq!(refresher.refresh_once().await.unwrap(), 3);

        let fresh_since = policy().fresh_since(Utc::now());
        assert_eq!(coin_cache::count_fresh(fresh_since, &pool).await.unwrap(), 3);
    }

    #[actix_web::test]
    async fn refresh_reports_provider_outage() {
        let pool = connect_in_memory().await.unwrap();
        let market = Arc::new(FakeMarket::with_listing(3).down());
        let refresher = CoinCacheRefresher::new(pool, market, policy(), Duration::from_secs(60));

        assert!(matches!(refresher.refresh_once().await, Err(RefreshError::Fetch { .. })));
    }
}
