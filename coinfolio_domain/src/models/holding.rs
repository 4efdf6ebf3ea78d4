use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, As, DisplayFromStr, PickFirst, Same};

use crate::models::validation::{
    self,
    ValidationError,
    required_text,
    optional_text,
    positive_number,
    non_negative_number,
    MissingFieldSnafu,
};

/// One recorded position. At most one exists per `coin_id`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Holding {
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

impl Holding {
    /// `quantity * purchase_price`, or `None` when the cost basis is unknown.
    pub fn cost_basis(&self) -> Option<f64> {
        self.purchase_price.map(|price| price * self.quantity)
    }
}

/// Body of an add-to-portfolio request before validation.
///
/// Numbers are accepted either as JSON numbers or as numeric strings.
#[serde_as]
#[derive(Deserialize, Default, Clone, Debug)]
pub struct NewHoldingRequest {
    #[serde(default)]
    pub coin_id: Option<String>,

    #[serde(default)]
    pub coin_name: Option<String>,

    #[serde(default)]
    pub symbol: Option<String>,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub quantity: Option<f64>,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub purchase_price: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewHolding {
    pub coin_id: String,
    pub coin_name: String,
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
}

impl NewHoldingRequest {
    pub fn validate(self) -> Result<NewHolding, ValidationError> {
        let coin_id = validation::coin_id("coin_id", self.coin_id)?;
        let coin_name = required_text("coin_name", self.coin_name)?;
        let symbol = required_text("symbol", self.symbol)?.to_uppercase();

        let quantity = match self.quantity {
            None => return MissingFieldSnafu { field: "quantity" }.fail(),
            Some(x) => positive_number("quantity", x)?,
        };

        let purchase_price = self.purchase_price
            .map(|x| non_negative_number("purchase_price", x))
            .transpose()?;

        Ok(NewHolding {
            coin_id,
            coin_name,
            symbol,
            quantity,
            purchase_price,
            notes: optional_text(self.notes),
        })
    }
}

/// Body of an update request. `purchase_price` and `notes` distinguish
/// "absent" (leave unchanged) from an explicit `null` (clear the value).
#[serde_as]
#[derive(Deserialize, Default, Clone, Debug)]
pub struct HoldingPatchRequest {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub quantity: Option<f64>,

    #[serde(default, deserialize_with = "present_number")]
    pub purchase_price: Option<Option<f64>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

/// A present field, `null` or numeric, becomes `Some`. Absent fields never
/// reach this and fall back to `None` through `default`.
fn present_number<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
    where D: Deserializer<'de>
{
    As::<Option<PickFirst<(Same, DisplayFromStr)>>>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoldingPatch {
    pub quantity: Option<f64>,
    pub purchase_price: Option<Option<f64>>,
    pub notes: Option<Option<String>>,
}

impl HoldingPatchRequest {
    pub fn validate(self) -> Result<HoldingPatch, ValidationError> {
        if self.quantity.is_none() && self.purchase_price.is_none() && self.notes.is_none() {
            return Err(ValidationError::EmptyPatch);
        }

        let quantity = self.quantity
            .map(|x| positive_number("quantity", x))
            .transpose()?;

        let purchase_price = match self.purchase_price {
            Some(Some(x)) => Some(Some(non_negative_number("purchase_price", x)?)),
            other => other,
        };

        let notes = self.notes.map(optional_text);

        Ok(HoldingPatch {
            quantity,
            purchase_price,
            notes,
        })
    }
}
