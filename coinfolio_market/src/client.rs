use std::time::Duration;

use async_trait::async_trait;
use leaky_bucket::RateLimiter;
use log::{debug, info};
use reqwest::{Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use coinfolio_domain::models::{
    PriceSnapshot,
    HistoryPoint,
    CoinSummary,
    SearchResult,
    clamp_history_days,
    clamp_per_page,
    DAILY_GRANULARITY_AFTER_DAYS,
};

use crate::MarketData;
use crate::coingecko::{SimplePriceResponse, MarketChartResponse, MarketCoin, SearchResponse};
use crate::error::{MarketError, HttpSnafu, StatusSnafu, DecodeSnafu, NoDataSnafu, InvalidQuerySnafu};
use crate::retry::RetryPolicy;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;

pub fn clamp_search_limit(limit: u32) -> u32 {
    limit.max(1).min(MAX_SEARCH_LIMIT)
}

/// Minimum spacing between calls of each kind.
#[derive(Clone, Copy, Debug)]
pub struct RateIntervals {
    pub price: Duration,
    pub history: Duration,
    pub markets: Duration,
    pub search: Duration,
}

impl Default for RateIntervals {
    fn default() -> Self {
        RateIntervals {
            price: Duration::from_secs(1),
            history: Duration::from_secs(2),
            markets: Duration::from_secs(2),
            search: Duration::from_secs(1),
        }
    }
}

struct RateLimiters {
    price: RateLimiter,
    history: RateLimiter,
    markets: RateLimiter,
    search: RateLimiter,
}

impl RateLimiters {
    fn new(intervals: &RateIntervals) -> RateLimiters {
        RateLimiters {
            price: one_per(intervals.price),
            history: one_per(intervals.history),
            markets: one_per(intervals.markets),
            search: one_per(intervals.search),
        }
    }
}

fn one_per(interval: Duration) -> RateLimiter {
    RateLimiter::builder()
        .max(1)
        .initial(1)
        .refill(1)
        .interval(interval.max(Duration::from_millis(1)))
        .build()
}

pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    limiters: RateLimiters,
}

impl CoinGeckoClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
        intervals: RateIntervals)
        -> Result<CoinGeckoClient, MarketError>
    {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinfolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(HttpSnafu)?;

        info!("Market data from {} (timeout {:?}, {} attempts)", base_url, timeout, retry.max_attempts);

        Ok(CoinGeckoClient {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry,
            limiters: RateLimiters::new(&intervals),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub fn price_request(&self, coin_id: &str) -> Result<Request, MarketError> {
        self.http.get(self.url("simple/price"))
            .query(&[
                ("ids", coin_id),
                ("vs_currencies", "usd"),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
                ("include_last_updated_at", "true"),
            ])
            .build()
            .context(HttpSnafu)
    }

    pub fn history_request(&self, coin_id: &str, days: u32) -> Result<Request, MarketError> {
        let days = clamp_history_days(days);
        let interval = if days > DAILY_GRANULARITY_AFTER_DAYS { "daily" } else { "hourly" };
        let days = days.to_string();

        self.http.get(self.url(&format!("coins/{}/market_chart", coin_id)))
            .query(&[
                ("vs_currency", "usd"),
                ("days", days.as_str()),
                ("interval", interval),
            ])
            .build()
            .context(HttpSnafu)
    }

    pub fn markets_request(&self, page: u32, per_page: u32, order: &str) -> Result<Request, MarketError> {
        let per_page = clamp_per_page(per_page).to_string();
        let page = page.max(1).to_string();

        self.http.get(self.url("coins/markets"))
            .query(&[
                ("vs_currency", "usd"),
                ("order", order),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("sparkline", "false"),
            ])
            .build()
            .context(HttpSnafu)
    }

    /// Rejects blank queries without building anything.
    pub fn search_request(&self, query: &str) -> Result<Request, MarketError> {
        let query = query.trim();
        if query.is_empty() {
            return InvalidQuerySnafu { reason: "search query must not be blank" }.fail();
        }

        self.http.get(self.url("search"))
            .query(&[("query", query)])
            .build()
            .context(HttpSnafu)
    }

    async fn fetch<T, B>(&self, limiter: &RateLimiter, subject: &str, build: B) -> Result<T, MarketError>
        where T: DeserializeOwned,
              B: Fn() -> Result<Request, MarketError> + Sync
    {
        let http = &self.http;
        let build = &build;

        self.retry.run(subject, move || async move {
            let request = build()?;
            limiter.acquire_one().await;

            debug!("GET {}", request.url());
            let response = http.execute(request).await.context(HttpSnafu)?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return NoDataSnafu { coin_id: subject }.fail();
            }
            if !status.is_success() {
                return StatusSnafu { status }.fail();
            }

            let body = response.bytes().await.context(HttpSnafu)?;
            serde_json::from_slice(&body).context(DecodeSnafu)
        }).await
    }
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn price(&self, coin_id: &str) -> Result<PriceSnapshot, MarketError> {
        let mut response: SimplePriceResponse =
            self.fetch(&self.limiters.price, coin_id, || self.price_request(coin_id)).await?;

        response.remove(coin_id)
            .and_then(|quote| quote.into_snapshot())
            .ok_or_else(|| MarketError::NoData { coin_id: coin_id.to_owned() })
    }

    async fn history(&self, coin_id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketError> {
        let response: MarketChartResponse =
            self.fetch(&self.limiters.history, coin_id, || self.history_request(coin_id, days)).await?;

        Ok(response.into_points())
    }

    async fn markets(&self, page: u32, per_page: u32, order: &str) -> Result<Vec<CoinSummary>, MarketError> {
        let coins: Vec<MarketCoin> =
            self.fetch(&self.limiters.markets, "coins/markets", || self.markets_request(page, per_page, order)).await?;

        Ok(coins.into_iter().map(CoinSummary::from).collect())
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, MarketError> {
        // Validate before waiting on the limiter.
        self.search_request(query)?;

        let response: SearchResponse =
            self.fetch(&self.limiters.search, query, || self.search_request(query)).await?;

        Ok(response.coins.into_iter()
            .take(clamp_search_limit(limit) as usize)
            .map(SearchResult::from)
            .collect())
    }

    async fn ping(&self) -> bool {
        let response = self.http.get(self.url("ping"))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(_) => true,
            Err(err) => {
                debug!("Ping failed: {}", err);
                false
            }
        }
    }
}
