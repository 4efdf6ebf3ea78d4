use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Holding, PriceSnapshot};
use crate::percentage_of;

/// A holding enriched with live market data.
///
/// Every derived field is `None` when no price could be retrieved for the
/// coin. Profit fields are also `None` when the cost basis is unknown.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HoldingPerformance {
    #[serde(flatten)]
    pub holding: Holding,

    pub price_available: bool,
    pub current_price: Option<f64>,
    pub current_value: Option<f64>,
    pub change_24h: Option<f64>,
    pub daily_change_value: Option<f64>,
    pub market_cap: Option<f64>,
    pub cost_basis: Option<f64>,
    pub profit_loss: Option<f64>,
    pub profit_loss_percentage: Option<f64>,
}

impl HoldingPerformance {
    pub fn evaluate(holding: Holding, price: Option<&PriceSnapshot>) -> HoldingPerformance {
        let cost_basis = holding.cost_basis();

        let price = match price {
            None => {
                return HoldingPerformance {
                    holding,
                    price_available: false,
                    current_price: None,
                    current_value: None,
                    change_24h: None,
                    daily_change_value: None,
                    market_cap: None,
                    cost_basis,
                    profit_loss: None,
                    profit_loss_percentage: None,
                }
            }
            Some(x) => x,
        };

        let current_value = holding.quantity * price.price;
        let daily_change_value = price.change_24h
            .map(|change| current_value * change / 100.0)
            .unwrap_or(0.0);

        let profit_loss = cost_basis.map(|basis| current_value - basis);
        let profit_loss_percentage = cost_basis
            .zip(profit_loss)
            .map(|(basis, pl)| percentage_of(pl, basis));

        HoldingPerformance {
            holding,
            price_available: true,
            current_price: Some(price.price),
            current_value: Some(current_value),
            change_24h: price.change_24h,
            daily_change_value: Some(daily_change_value),
            market_cap: price.market_cap,
            cost_basis,
            profit_loss,
            profit_loss_percentage,
        }
    }
}

/// Compact reference to a holding used by the summary's superlatives.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HoldingHighlight {
    pub id: i64,
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub current_value: f64,
    pub profit_loss: Option<f64>,
    pub profit_loss_percentage: Option<f64>,
}

impl HoldingHighlight {
    fn of(x: &HoldingPerformance) -> HoldingHighlight {
        HoldingHighlight {
            id: x.holding.id,
            coin_id: x.holding.coin_id.clone(),
            coin_name: x.holding.coin_name.clone(),
            symbol: x.holding.symbol.clone(),
            current_value: x.current_value.unwrap_or(0.0),
            profit_loss: x.profit_loss,
            profit_loss_percentage: x.profit_loss_percentage,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AllocationEntry {
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_invested: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percentage: f64,
    pub daily_change: f64,
    pub daily_change_percentage: f64,
    pub best_performer: Option<HoldingHighlight>,
    pub worst_performer: Option<HoldingHighlight>,
    pub largest_holding: Option<HoldingHighlight>,
    pub allocation: Vec<AllocationEntry>,
    pub holdings_count: usize,
    pub priced_count: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PortfolioAnalytics {
    pub summary: PortfolioSummary,
    pub holdings: Vec<HoldingPerformance>,
}

/// Combines holdings with one price snapshot per coin.
///
/// Holdings whose coin has no entry in `prices` are kept in the output but
/// contribute nothing to any total.
pub fn analyze(holdings: Vec<Holding>, prices: &HashMap<String, PriceSnapshot>) -> PortfolioAnalytics {
    let holdings: Vec<HoldingPerformance> = holdings.into_iter()
        .map(|h| {
            let price = prices.get(&h.coin_id);
            HoldingPerformance::evaluate(h, price)
        })
        .collect();

    let summary = summarize(&holdings);
    PortfolioAnalytics { summary, holdings }
}

pub fn summarize(holdings: &[HoldingPerformance]) -> PortfolioSummary {
    let mut total_value = 0.0;
    let mut total_invested = 0.0;
    let mut value_with_cost_basis = 0.0;
    let mut daily_change = 0.0;
    let mut priced_count = 0;

    for x in holdings {
        let value = match x.current_value {
            None => continue,
            Some(v) => v,
        };

        priced_count += 1;
        total_value += value;
        daily_change += x.daily_change_value.unwrap_or(0.0);

        if let Some(basis) = x.cost_basis {
            total_invested += basis;
            value_with_cost_basis += value;
        }
    }

    let total_profit_loss = value_with_cost_basis - total_invested;

    let best_performer = pick(holdings, |x| x.profit_loss_percentage, |a, b| a > b);
    let worst_performer = pick(holdings, |x| x.profit_loss_percentage, |a, b| a < b);
    let largest_holding = pick(holdings, |x| x.current_value, |a, b| a > b);

    PortfolioSummary {
        total_value,
        total_invested,
        total_profit_loss,
        total_profit_loss_percentage: percentage_of(total_profit_loss, total_invested),
        daily_change,
        daily_change_percentage: percentage_of(daily_change, total_value),
        best_performer: best_performer.map(HoldingHighlight::of),
        worst_performer: worst_performer.map(HoldingHighlight::of),
        largest_holding: largest_holding.map(HoldingHighlight::of),
        allocation: allocation(holdings, total_value),
        holdings_count: holdings.len(),
        priced_count,
    }
}

/// Share of `total_value` per priced holding, largest first. Empty when the
/// portfolio has no value.
pub fn allocation(holdings: &[HoldingPerformance], total_value: f64) -> Vec<AllocationEntry> {
    if total_value <= 0.0 {
        return Vec::new();
    }

    let mut entries: Vec<AllocationEntry> = holdings.iter()
        .filter_map(|x| x.current_value.map(|value| AllocationEntry {
            coin_id: x.holding.coin_id.clone(),
            coin_name: x.holding.coin_name.clone(),
            symbol: x.holding.symbol.clone(),
            value,
            percentage: percentage_of(value, total_value),
        }))
        .collect();

    entries.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    entries
}

// First holding wins ties.
fn pick<'a, K, B>(holdings: &'a [HoldingPerformance], key: K, better: B) -> Option<&'a HoldingPerformance>
where
    K: Fn(&HoldingPerformance) -> Option<f64>,
    B: Fn(f64, f64) -> bool,
{
    let mut chosen: Option<(&HoldingPerformance, f64)> = None;
    for x in holdings {
        let value = match key(x) {
            None => continue,
            Some(v) => v,
        };

        match chosen {
            Some((_, current)) if !better(value, current) => {}
            _ => chosen = Some((x, value)),
        }
    }
    chosen.map(|(x, _)| x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn holding(id: i64, coin_id: &str, quantity: f64, purchase_price: Option<f64>) -> Holding {
        let now = Utc::now();
        Holding {
            id,
            coin_id: coin_id.to_owned(),
            coin_name: coin_id.to_uppercase(),
            symbol: coin_id[..3].to_uppercase(),
            quantity,
            purchase_price,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn price(price: f64, change_24h: Option<f64>) -> PriceSnapshot {
        PriceSnapshot {
            price,
            change_24h,
            volume_24h: None,
            market_cap: None,
            last_updated: None,
        }
    }

    fn prices(entries: &[(&str, PriceSnapshot)]) -> HashMap<String, PriceSnapshot> {
        entries.iter()
            .map(|(id, p)| (id.to_string(), p.clone()))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn single_holding_profit_loss() {
        let result = analyze(
            vec![holding(1, "bitcoin", 0.5, Some(45000.0))],
            &prices(&[("bitcoin", price(50000.0, None))]));

        let btc = &result.holdings[0];
        assert_eq!(btc.current_value, Some(25000.0));
        assert_eq!(btc.profit_loss, Some(2500.0));
        assert!(approx(btc.profit_loss_percentage.unwrap(), 11.111111));

        assert_eq!(result.summary.total_value, 25000.0);
        assert_eq!(result.summary.total_invested, 22500.0);
        assert_eq!(result.summary.total_profit_loss, 2500.0);
        assert!(approx(result.summary.total_profit_loss_percentage, 11.111111));
    }

    #[test]
    fn no_cost_basis_means_no_profit_fields() {
        let result = analyze(
            vec![holding(1, "ethereum", 3.0, None)],
            &prices(&[("ethereum", price(2000.0, Some(5.0)))]));

        let eth = &result.holdings[0];
        assert_eq!(eth.profit_loss, None);
        assert_eq!(eth.profit_loss_percentage, None);
        assert_eq!(result.summary.total_invested, 0.0);
        assert_eq!(result.summary.total_profit_loss_percentage, 0.0);
        assert_eq!(result.summary.best_performer, None);
        assert_eq!(result.summary.worst_performer, None);
    }

    #[test]
    fn allocation_and_largest_holding() {
        let result = analyze(
            vec![
                holding(1, "ethereum", 10.0, None),
                holding(2, "bitcoin", 1.5, None),
            ],
            &prices(&[
                ("ethereum", price(2500.0, None)),
                ("bitcoin", price(50000.0, None)),
            ]));

        let summary = &result.summary;
        assert_eq!(summary.total_value, 100000.0);
        assert_eq!(summary.largest_holding.as_ref().unwrap().coin_id, "bitcoin");

        assert_eq!(summary.allocation.len(), 2);
        assert_eq!(summary.allocation[0].coin_id, "bitcoin");
        assert!(approx(summary.allocation[0].percentage, 75.0));
        assert!(approx(summary.allocation[1].percentage, 25.0));

        let total: f64 = summary.allocation.iter().map(|x| x.percentage).sum();
        assert!(approx(total, 100.0));
    }

    #[test]
    fn unpriced_holdings_are_flagged_and_excluded_from_sums() {
        let result = analyze(
            vec![
                holding(1, "bitcoin", 1.0, Some(40000.0)),
                holding(2, "obscurecoin", 1000.0, Some(1.0)),
            ],
            &prices(&[("bitcoin", price(50000.0, Some(2.0)))]));

        assert_eq!(result.holdings.len(), 2);

        let obscure = &result.holdings[1];
        assert!(!obscure.price_available);
        assert_eq!(obscure.current_value, None);
        assert_eq!(obscure.profit_loss, None);
        assert_eq!(obscure.cost_basis, Some(1000.0));

        let summary = &result.summary;
        assert_eq!(summary.total_value, 50000.0);
        assert_eq!(summary.total_invested, 40000.0);
        assert_eq!(summary.total_profit_loss, 10000.0);
        assert_eq!(summary.holdings_count, 2);
        assert_eq!(summary.priced_count, 1);
        assert_eq!(summary.allocation.len(), 1);
        assert!(approx(summary.daily_change, 1000.0));
        assert!(approx(summary.daily_change_percentage, 2.0));
    }

    #[test]
    fn zero_value_portfolio_has_no_allocation() {
        let result = analyze(
            vec![holding(1, "deadcoin", 5.0, Some(2.0))],
            &prices(&[("deadcoin", price(0.0, Some(-100.0)))]));

        let summary = &result.summary;
        assert_eq!(summary.total_value, 0.0);
        assert!(summary.allocation.is_empty());
        assert_eq!(summary.daily_change_percentage, 0.0);
        assert!(approx(summary.total_profit_loss_percentage, -100.0));
    }

    #[test]
    fn empty_portfolio() {
        let result = analyze(Vec::new(), &HashMap::new());
        let summary = &result.summary;

        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.total_profit_loss_percentage, 0.0);
        assert_eq!(summary.largest_holding, None);
        assert!(summary.allocation.is_empty());
    }

    #[test]
    fn best_and_worst_performers() {
        let result = analyze(
            vec![
                holding(1, "bitcoin", 1.0, Some(25000.0)),
                holding(2, "ethereum", 1.0, Some(4000.0)),
                holding(3, "solana", 1.0, None),
                holding(4, "cardano", 100.0, Some(0.5)),
            ],
            &prices(&[
                ("bitcoin", price(50000.0, None)),
                ("ethereum", price(2000.0, None)),
                ("solana", price(100.0, None)),
                ("cardano", price(0.5, None)),
            ]));

        let summary = &result.summary;
        assert_eq!(summary.best_performer.as_ref().unwrap().coin_id, "bitcoin");
        assert_eq!(summary.worst_performer.as_ref().unwrap().coin_id, "ethereum");
    }

    #[test]
    fn zero_purchase_price_reports_zero_percentage() {
        let result = analyze(
            vec![holding(1, "airdrop", 10.0, Some(0.0))],
            &prices(&[("airdrop", price(3.0, None))]));

        let airdrop = &result.holdings[0];
        assert_eq!(airdrop.profit_loss, Some(30.0));
        assert_eq!(airdrop.profit_loss_percentage, Some(0.0));
    }
}
