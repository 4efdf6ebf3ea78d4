
pub mod validation;
pub use validation::ValidationError;

mod holding;
pub use holding::{
    Holding,
    NewHolding,
    NewHoldingRequest,
    HoldingPatch,
    HoldingPatchRequest,
};

mod watchlist;
pub use watchlist::{WatchlistEntry, NewWatchlistEntry, NewWatchlistEntryRequest};

mod coin;
pub use coin::{
    CoinSummary,
    CachedCoinSummary,
    PriceSnapshot,
    HistoryPoint,
    SearchResult,
    clamp_history_days,
    clamp_per_page,
    MIN_HISTORY_DAYS,
    MAX_HISTORY_DAYS,
    DAILY_GRANULARITY_AFTER_DAYS,
    MAX_MARKETS_PER_PAGE,
};
