//! Normalized sale records as handed over by the ingestion layer

use serde::{Deserialize, Serialize};
use std::error::Error;

/// One settled property sale. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub suburb: String,
    pub postcode: String,
    /// Whole currency units
    pub price: i64,
    /// Square metres, 0.0 when unknown
    #[serde(default)]
    pub land_area: f64,
    /// YYYYMMDD, compares lexicographically
    pub settlement_date: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contract_date: Option<String>,
    #[serde(default)]
    pub zone_code: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub property_desc: Option<String>,
    /// Bulk file the record was imported from
    #[serde(default)]
    pub source_file: Option<String>,
}

/// Grouping key for suburb statistics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SuburbKey {
    pub suburb: String,
    pub postcode: String,
}

impl SuburbKey {
    pub fn new(suburb: impl Into<String>, postcode: impl Into<String>) -> Self {
        Self {
            suburb: suburb.into(),
            postcode: postcode.into(),
        }
    }

    /// Case-insensitive suburb, exact postcode
    pub fn matches(&self, suburb: &str, postcode: &str) -> bool {
        self.postcode == postcode && self.suburb.eq_ignore_ascii_case(suburb)
    }
}

impl Sale {
    pub fn new(
        id: impl Into<String>,
        suburb: impl Into<String>,
        postcode: impl Into<String>,
        price: i64,
        land_area: f64,
        settlement_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            suburb: suburb.into(),
            postcode: postcode.into(),
            price,
            land_area,
            settlement_date: settlement_date.into(),
            address: None,
            contract_date: None,
            zone_code: None,
            property_type: None,
            property_id: None,
            property_desc: None,
            source_file: None,
        }
    }

    /// Parse a Sale from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let sale: Sale = serde_json::from_str(line)?;
        Ok(sale)
    }

    /// `price / land_area`, or `None` when the area is unknown
    pub fn price_per_area(&self) -> Option<f64> {
        if self.land_area > 0.0 {
            Some(self.price as f64 / self.land_area)
        } else {
            None
        }
    }

    /// True when the sale can take part in a price-per-area distribution
    pub fn has_area_price(&self) -> bool {
        self.price_per_area().map_or(false, |ppa| ppa > 0.0)
    }

    /// First 3 characters of the postcode
    pub fn postcode_prefix(&self) -> &str {
        leading_chars(&self.postcode, 3)
    }

    /// YYYYMM part of the settlement date
    pub fn settlement_month(&self) -> &str {
        leading_chars(&self.settlement_date, 6)
    }

    pub fn suburb_key(&self) -> SuburbKey {
        SuburbKey::new(self.suburb.clone(), self.postcode.clone())
    }
}

fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
