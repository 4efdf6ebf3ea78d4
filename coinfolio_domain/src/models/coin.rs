use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Above this many days the provider samples daily, otherwise hourly.
pub const DAILY_GRANULARITY_AFTER_DAYS: u32 = 90;

pub const MAX_MARKETS_PER_PAGE: u32 = 100;

pub fn clamp_history_days(days: u32) -> u32 {
    days.max(MIN_HISTORY_DAYS).min(MAX_HISTORY_DAYS)
}

pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.max(1).min(MAX_MARKETS_PER_PAGE)
}

/// One row of a market listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CoinSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<i64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub image: Option<String>,
}

/// A persisted market snapshot, used in place of a live listing while fresh.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CachedCoinSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i64>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl CachedCoinSummary {
    pub fn from_summary(coin: &CoinSummary, last_updated: DateTime<Utc>) -> CachedCoinSummary {
        CachedCoinSummary {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.clone(),
            market_cap_rank: coin.market_cap_rank,
            current_price: coin.current_price,
            market_cap: coin.market_cap,
            price_change_24h: coin.price_change_24h,
            price_change_percentage_24h: coin.price_change_percentage_24h,
            last_updated,
        }
    }
}

impl From<CachedCoinSummary> for CoinSummary {
    fn from(x: CachedCoinSummary) -> CoinSummary {
        CoinSummary {
            id: x.id,
            name: x.name,
            symbol: x.symbol,
            current_price: x.current_price,
            market_cap: x.market_cap,
            market_cap_rank: x.market_cap_rank,
            price_change_24h: x.price_change_24h,
            price_change_percentage_24h: x.price_change_percentage_24h,
            image: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    pub change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    /// Unix epoch milliseconds, as reported by the provider.
    pub timestamp: i64,
    /// `%Y-%m-%d` in UTC.
    pub date: String,
    pub price: f64,
    pub volume: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i64>,
    pub thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_days_are_clamped() {
        assert_eq!(clamp_history_days(0), 1);
        assert_eq!(clamp_history_days(30), 30);
        assert_eq!(clamp_history_days(1000), 365);
    }

    #[test]
    fn per_page_is_clamped_to_documented_maximum() {
        assert_eq!(clamp_per_page(150), MAX_MARKETS_PER_PAGE);
        assert_eq!(clamp_per_page(0), 1);
        assert_eq!(clamp_per_page(50), 50);
    }

    #[test]
    fn cached_summary_round_trips_into_listing_row() {
        let coin = CoinSummary {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            current_price: Some(50000.0),
            market_cap: Some(1.0e12),
            market_cap_rank: Some(1),
            price_change_24h: Some(-120.5),
            price_change_percentage_24h: Some(-0.24),
            image: Some("https://example.invalid/btc.png".into()),
        };

        let cached = CachedCoinSummary::from_summary(&coin, Utc::now());
        let back = CoinSummary::from(cached);

        assert_eq!(back.image, None);
        assert_eq!(CoinSummary { image: coin.image.clone(), ..back }, coin);
    }
}
