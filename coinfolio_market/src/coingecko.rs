//! CoinGecko v3 response shapes and their conversion into domain records.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde::Deserialize;

use coinfolio_domain::models::{PriceSnapshot, HistoryPoint, CoinSummary, SearchResult};

/// `/simple/price`, keyed by coin id.
pub type SimplePriceResponse = HashMap<String, SimplePrice>;

#[derive(Deserialize, Debug, Default)]
pub struct SimplePrice {
    pub usd: Option<f64>,
    pub usd_market_cap: Option<f64>,
    pub usd_24h_vol: Option<f64>,
    pub usd_24h_change: Option<f64>,
    pub last_updated_at: Option<i64>,
}

impl SimplePrice {
    /// `None` when the provider has no USD price.
    pub fn into_snapshot(self) -> Option<PriceSnapshot> {
        let price = self.usd?;
        Some(PriceSnapshot {
            price,
            change_24h: self.usd_24h_change,
            volume_24h: self.usd_24h_vol,
            market_cap: self.usd_market_cap,
            last_updated: self.last_updated_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
    }
}

/// `/coins/{id}/market_chart`. Each pair is `[epoch_millis, value]`.
#[derive(Deserialize, Debug, Default)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,

    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

impl MarketChartResponse {
    pub fn into_points(self) -> Vec<HistoryPoint> {
        let volumes: HashMap<i64, f64> = self.total_volumes.into_iter()
            .map(|(ts, volume)| (ts as i64, volume))
            .collect();

        self.prices.into_iter()
            .filter_map(|(ts, price)| {
                let timestamp = ts as i64;
                let date = Utc.timestamp_millis_opt(timestamp).single()?;
                Some(HistoryPoint {
                    timestamp,
                    date: date.format("%Y-%m-%d").to_string(),
                    price,
                    volume: volumes.get(&timestamp).copied(),
                })
            })
            .collect()
    }
}

/// One row of `/coins/markets`.
#[derive(Deserialize, Debug)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<i64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

impl From<MarketCoin> for CoinSummary {
    fn from(x: MarketCoin) -> CoinSummary {
        CoinSummary {
            id: x.id,
            name: x.name,
            symbol: x.symbol.to_uppercase(),
            current_price: x.current_price,
            market_cap: x.market_cap,
            market_cap_rank: x.market_cap_rank,
            price_change_24h: x.price_change_24h,
            price_change_percentage_24h: x.price_change_percentage_24h,
            image: x.image,
        }
    }
}

/// `/search`. Only the coin matches are used.
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub coins: Vec<SearchCoin>,
}

#[derive(Deserialize, Debug)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i64>,
    pub thumb: Option<String>,
}

impl From<SearchCoin> for SearchResult {
    fn from(x: SearchCoin) -> SearchResult {
        SearchResult {
            id: x.id,
            name: x.name,
            symbol: x.symbol.to_uppercase(),
            market_cap_rank: x.market_cap_rank,
            thumbnail: x.thumb,
        }
    }
}
