//! In-process stand-ins for the market data provider.

use std::collections::HashMap;

use async_trait::async_trait;

use coinfolio_domain::models::{PriceSnapshot, HistoryPoint, CoinSummary, SearchResult};
use coinfolio_market::{MarketData, MarketError};

#[derive(Default)]
pub struct FakeMarket {
    prices: HashMap<String, PriceSnapshot>,
    listing: Vec<CoinSummary>,
    down: bool,
}

impl FakeMarket {
    pub fn new() -> FakeMarket {
        FakeMarket::default()
    }

    /// `coin0`, `coin1`, ... ranked in order, alternating up and down moves.
    pub fn with_listing(count: usize) -> FakeMarket {
        let listing = (0..count)
            .map(|i| CoinSummary {
                id: format!("coin{}", i),
                name: format!("Coin {}", i),
                symbol: format!("C{}", i),
                current_price: Some(10.0 * (i + 1) as f64),
                market_cap: Some(1000.0 / (i + 1) as f64),
                market_cap_rank: Some(i as i64 + 1),
                price_change_24h: None,
                price_change_percentage_24h: Some(if i % 2 == 0 { 2.0 } else { -2.0 }),
                image: None,
            })
            .collect();

        FakeMarket { listing, ..FakeMarket::default() }
    }

    pub fn with_price(mut self, coin_id: &str, price: f64, change_24h: f64) -> FakeMarket {
        self.prices.insert(coin_id.to_owned(), PriceSnapshot {
            price,
            change_24h: Some(change_24h),
            volume_24h: None,
            market_cap: Some(price * 1_000_000.0),
            last_updated: None,
        });
        self
    }

    pub fn down(mut self) -> FakeMarket {
        self.down = true;
        self
    }

    fn available(&self) -> Result<(), MarketError> {
        if self.down {
            return Err(MarketError::RateLimited { attempts: 3 });
        }
        Ok(())
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn price(&self, coin_id: &str) -> Result<PriceSnapshot, MarketError> {
        self.available()?;
        self.prices.get(coin_id)
            .cloned()
            .ok_or_else(|| MarketError::NoData { coin_id: coin_id.to_owned() })
    }

    async fn history(&self, coin_id: &str, _days: u32) -> Result<Vec<HistoryPoint>, MarketError> {
        let snapshot = self.price(coin_id).await?;
        Ok(vec![
            HistoryPoint { timestamp: 0, date: "1970-01-01".into(), price: snapshot.price / 2.0, volume: None },
            HistoryPoint { timestamp: 86_400_000, date: "1970-01-02".into(), price: snapshot.price, volume: None },
        ])
    }

    async fn markets(&self, page: u32, per_page: u32, _order: &str) -> Result<Vec<CoinSummary>, MarketError> {
        self.available()?;
        let start = (page.max(1) as usize - 1) * per_page as usize;
        Ok(self.listing.iter().skip(start).take(per_page as usize).cloned().collect())
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, MarketError> {
        if query.trim().is_empty() {
            return Err(MarketError::InvalidQuery { reason: "search query must not be blank".into() });
        }
        self.available()?;

        Ok(self.listing.iter()
            .filter(|c| c.id.contains(query) || c.name.contains(query))
            .take(limit as usize)
            .map(|c| SearchResult {
                id: c.id.clone(),
                name: c.name.clone(),
                symbol: c.symbol.clone(),
                market_cap_rank: c.market_cap_rank,
                thumbnail: None,
            })
            .collect())
    }

    async fn ping(&self) -> bool {
        !self.down
    }
}
