use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::validation::{self, ValidationError, required_text};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WatchlistEntry {
    pub id: i64,
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct NewWatchlistEntryRequest {
    #[serde(default)]
    pub coin_id: Option<String>,

    #[serde(default)]
    pub coin_name: Option<String>,

    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewWatchlistEntry {
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
}

impl NewWatchlistEntryRequest {
    pub fn validate(self) -> Result<NewWatchlistEntry, ValidationError> {
        Ok(NewWatchlistEntry {
            coin_id: validation::coin_id("coin_id", self.coin_id)?,
            coin_name: required_text("coin_name", self.coin_name)?,
            symbol: required_text("symbol", self.symbol)?.to_uppercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchlist_entry_requires_all_fields() {
        let request = NewWatchlistEntryRequest {
            coin_id: Some("solana".into()),
            coin_name: Some("Solana".into()),
            symbol: None,
        };
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "symbol" }));
    }

    #[test]
    fn watchlist_symbol_is_uppercased() {
        let request = NewWatchlistEntryRequest {
            coin_id: Some("solana".into()),
            coin_name: Some("Solana".into()),
            symbol: Some("sol".into()),
        };
        assert_eq!(request.validate().unwrap().symbol, "SOL");
    }
}
