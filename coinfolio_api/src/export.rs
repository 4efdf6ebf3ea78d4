use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use snafu::{Snafu, ResultExt};

use coinfolio_domain::models::{Holding, ValidationError};

pub const CSV_COLUMNS: &[&str] = &[
    "id",
    "coin_id",
    "coin_name",
    "symbol",
    "quantity",
    "purchase_price",
    "notes",
    "created_at",
    "updated_at",
];

#[derive(Debug, Snafu)]
pub enum ExportError {
    #[snafu(display("Failed to write CSV: {}", source))]
    Csv { source: csv::Error },

    #[snafu(display("Failed to flush CSV: {}", source))]
    Flush { source: std::io::Error },

    #[snafu(display("CSV output is not UTF-8: {}", source))]
    Encoding { source: std::string::FromUtf8Error },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn filename(&self, now: DateTime<Utc>) -> String {
        format!("portfolio_export_{}.{}", now.format("%Y%m%d_%H%M%S"), self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ValidationError::InvalidField {
                field: "format",
                reason: format!("unsupported export format '{}', expected 'json' or 'csv'", other),
            }),
        }
    }
}

/// Renders holdings as CSV. The header row is always present.
pub fn holdings_csv(holdings: &[Holding]) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);

    wtr.write_record(CSV_COLUMNS).context(CsvSnafu)?;
    for holding in holdings {
        wtr.serialize(holding).context(CsvSnafu)?;
    }

    let buf = wtr.into_inner().map_err(|e| e.into_error()).context(FlushSnafu)?;
    String::from_utf8(buf).context(EncodingSnafu)
}
