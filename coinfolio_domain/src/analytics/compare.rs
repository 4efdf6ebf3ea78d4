use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::models::{HistoryPoint, ValidationError, clamp_history_days};
use crate::models::validation;
use crate::percentage_of;

pub const MIN_COMPARE_COINS: usize = 2;
pub const MAX_COMPARE_COINS: usize = 10;
pub const DEFAULT_COMPARE_DAYS: u32 = 30;

#[serde_as]
#[derive(Deserialize, Default, Clone, Debug)]
pub struct CompareRequest {
    #[serde(default)]
    pub coin_ids: Option<Vec<String>>,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub days: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub coin_ids: Vec<String>,
    pub days: u32,
}

impl CompareRequest {
    pub fn validate(self) -> Result<Comparison, ValidationError> {
        let raw = match self.coin_ids {
            None => return Err(ValidationError::MissingField { field: "coin_ids" }),
            Some(x) => x,
        };

        if raw.len() < MIN_COMPARE_COINS || raw.len() > MAX_COMPARE_COINS {
            return Err(ValidationError::InvalidField {
                field: "coin_ids",
                reason: format!("expected between {} and {} coins, got {}",
                                MIN_COMPARE_COINS, MAX_COMPARE_COINS, raw.len()),
            });
        }

        let mut seen = HashSet::new();
        let mut coin_ids = Vec::with_capacity(raw.len());
        for id in raw {
            let id = validation::coin_id("coin_ids", Some(id))?;
            if !seen.insert(id.clone()) {
                return Err(ValidationError::InvalidField {
                    field: "coin_ids",
                    reason: format!("'{}' is listed more than once", id),
                });
            }
            coin_ids.push(id);
        }

        Ok(Comparison {
            coin_ids,
            days: clamp_history_days(self.days.unwrap_or(DEFAULT_COMPARE_DAYS)),
        })
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CoinComparison {
    pub coin_id: String,
    pub available: bool,
    pub start_price: Option<f64>,
    pub end_price: Option<f64>,
    pub change_percentage: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub points: Vec<HistoryPoint>,
}

/// Period statistics for one coin. `points` must be in chronological order;
/// `None` or an empty series yields an unavailable entry with null stats.
pub fn compare_series(coin_id: String, points: Option<Vec<HistoryPoint>>) -> CoinComparison {
    let points = points.unwrap_or_default();

    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.price, last.price),
        _ => {
            return CoinComparison {
                coin_id,
                available: false,
                start_price: None,
                end_price: None,
                change_percentage: None,
                high: None,
                low: None,
                points,
            }
        }
    };

    let high = points.iter().map(|p| p.price).fold(f64::MIN, f64::max);
    let low = points.iter().map(|p| p.price).fold(f64::MAX, f64::min);

    CoinComparison {
        coin_id,
        available: true,
        start_price: Some(first),
        end_price: Some(last),
        change_percentage: Some(percentage_of(last - first, first)),
        high: Some(high),
        low: Some(low),
        points,
    }
}

/// Compares each coin's history in the given order.
pub fn compare<I>(histories: I) -> Vec<CoinComparison>
    where I: IntoIterator<Item = (String, Option<Vec<HistoryPoint>>)>
{
    histories.into_iter()
        .map(|(coin_id, points)| compare_series(coin_id, points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(timestamp: i64, price: f64) -> HistoryPoint {
        HistoryPoint {
            timestamp,
            date: "2024-01-01".into(),
            price,
            volume: None,
        }
    }

    fn ids(ids: &[&str]) -> Option<Vec<String>> {
        Some(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn compare_request_bounds() {
        let one = CompareRequest { coin_ids: ids(&["bitcoin"]), days: None };
        assert!(matches!(one.validate(), Err(ValidationError::InvalidField { field: "coin_ids", .. })));

        let eleven: Vec<String> = (0..11).map(|i| format!("coin{}", i)).collect();
        let eleven = CompareRequest { coin_ids: Some(eleven), days: None };
        assert!(eleven.validate().is_err());

        let missing = CompareRequest { coin_ids: None, days: Some(7) };
        assert_eq!(missing.validate(), Err(ValidationError::MissingField { field: "coin_ids" }));
    }

    #[test]
    fn compare_request_rejects_duplicates() {
        let request = CompareRequest { coin_ids: ids(&["bitcoin", "BITCOIN"]), days: None };
        assert!(request.validate().is_err());
    }

    #[test]
    fn compare_request_defaults_and_clamps_days() {
        let request = CompareRequest { coin_ids: ids(&["bitcoin", "ethereum"]), days: None };
        assert_eq!(request.validate().unwrap().days, DEFAULT_COMPARE_DAYS);

        let request = CompareRequest { coin_ids: ids(&["bitcoin", "ethereum"]), days: Some(9999) };
        assert_eq!(request.validate().unwrap().days, 365);
    }

    #[test]
    fn compare_request_accepts_string_days() {
        let request: CompareRequest = serde_json::from_str(
            r#"{"coin_ids": ["bitcoin", "ethereum"], "days": "7"}"#).unwrap();
        assert_eq!(request.validate().unwrap().days, 7);
    }

    #[test]
    fn series_statistics() {
        let result = compare_series(
            "bitcoin".into(),
            Some(vec![point(1, 100.0), point(2, 150.0), point(3, 80.0), point(4, 120.0)]));

        assert!(result.available);
        assert_eq!(result.start_price, Some(100.0));
        assert_eq!(result.end_price, Some(120.0));
        assert_eq!(result.high, Some(150.0));
        assert_eq!(result.low, Some(80.0));
        assert!((result.change_percentage.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn compare_keeps_request_order() {
        let result = compare(vec![
            ("ethereum".to_owned(), Some(vec![point(1, 10.0), point(2, 5.0)])),
            ("ghost".to_owned(), None),
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].coin_id, "ethereum");
        assert_eq!(result[0].change_percentage, Some(-50.0));
        assert!(!result[1].available);
    }

    #[test]
    fn missing_series_is_unavailable() {
        let result = compare_series("ghost".into(), None);
        assert!(!result.available);
        assert_eq!(result.change_percentage, None);
        assert!(result.points.is_empty());
    }
}
