use serde::Serialize;

use crate::models::CoinSummary;

pub const TOP_MOVERS: usize = 10;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MarketMover {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    pub price_change_percentage_24h: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MarketOverview {
    pub coins_count: usize,
    pub total_market_cap: f64,
    pub average_change_percentage_24h: f64,
    pub best_performer: Option<MarketMover>,
    pub worst_performer: Option<MarketMover>,
    pub top_gainers: Vec<MarketMover>,
    pub top_losers: Vec<MarketMover>,
}

/// Aggregates a market listing. Coins without a 24h change are counted in the
/// market cap but ignored for every performance figure.
pub fn overview(coins: &[CoinSummary]) -> MarketOverview {
    let total_market_cap: f64 = coins.iter()
        .filter_map(|c| c.market_cap)
        .sum();

    let mut movers: Vec<MarketMover> = coins.iter()
        .filter_map(|c| c.price_change_percentage_24h.map(|change| MarketMover {
            id: c.id.clone(),
            name: c.name.clone(),
            symbol: c.symbol.clone(),
            current_price: c.current_price,
            price_change_percentage_24h: change,
        }))
        .collect();

    let average_change_percentage_24h = if movers.is_empty() {
        0.0
    } else {
        movers.iter().map(|m| m.price_change_percentage_24h).sum::<f64>() / movers.len() as f64
    };

    movers.sort_by(|a, b| b.price_change_percentage_24h.total_cmp(&a.price_change_percentage_24h));

    let top_gainers: Vec<MarketMover> = movers.iter()
        .filter(|m| m.price_change_percentage_24h > 0.0)
        .take(TOP_MOVERS)
        .cloned()
        .collect();

    let top_losers: Vec<MarketMover> = movers.iter()
        .rev()
        .filter(|m| m.price_change_percentage_24h < 0.0)
        .take(TOP_MOVERS)
        .cloned()
        .collect();

    MarketOverview {
        coins_count: coins.len(),
        total_market_cap,
        average_change_percentage_24h,
        best_performer: movers.first().cloned(),
        worst_performer: movers.last().cloned(),
        top_gainers,
        top_losers,
    }
}
