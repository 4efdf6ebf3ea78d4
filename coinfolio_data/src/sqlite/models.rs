use chrono::{DateTime, Utc};
use coinfolio_domain::models::{Holding, WatchlistEntry, CachedCoinSummary};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct HoldingRow {
    pub id: i64,
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HoldingRow> for Holding {
    fn from(row: HoldingRow) -> Self {
        Holding {
            id: row.id,
            coin_id: row.coin_id,
            coin_name: row.coin_name,
            symbol: row.symbol,
            quantity: row.quantity,
            purchase_price: row.purchase_price,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct WatchlistRow {
    pub id: i64,
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

impl From<WatchlistRow> for WatchlistEntry {
    fn from(row: WatchlistRow) -> Self {
        WatchlistEntry {
            id: row.id,
            coin_id: row.coin_id,
            coin_name: row.coin_name,
            symbol: row.symbol,
            added_at: row.added_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CoinCacheRow {
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

impl From<CoinCacheRow> for CachedCoinSummary {
    fn from(row: CoinCacheRow) -> Self {
        CachedCoinSummary {
            id: row.id,
            name: row.name,
            symbol: row.symbol,
            market_cap_rank: row.market_cap_rank,
            current_price: row.current_price,
            market_cap: row.market_cap,
            price_change_24h: row.price_change_24h,
            price_change_percentage_24h: row.price_change_percentage_24h,
            last_updated: row.last_updated,
        }
    }
}
