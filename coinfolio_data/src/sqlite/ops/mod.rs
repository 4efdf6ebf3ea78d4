pub mod holding;
pub mod watchlist;
pub mod coin_cache;
