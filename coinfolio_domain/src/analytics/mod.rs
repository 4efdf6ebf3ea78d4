pub mod portfolio;
pub mod market;
pub mod compare;

pub use portfolio::{
    analyze,
    PortfolioAnalytics,
    PortfolioSummary,
    HoldingPerformance,
    HoldingHighlight,
    AllocationEntry,
};
pub use market::{overview, MarketOverview, MarketMover};
pub use compare::{compare, compare_series, CompareRequest, Comparison, CoinComparison};
