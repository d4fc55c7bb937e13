//! Monthly price-per-area feature table grouped by postcode prefix
//!
//! Read-only input for a downstream forecasting model. No fitting or
//! prediction happens here.

use super::sale::Sale;
use serde::Serialize;
use std::collections::BTreeMap;

/// Months with fewer sales than this are too thin to use
pub const MIN_MONTH_SALES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefixMonthStats {
    pub postcode_prefix: String,
    /// YYYYMM
    pub month: String,
    pub sales_count: usize,
    pub avg_price_per_area: f64,
    pub min_price_per_area: f64,
    pub max_price_per_area: f64,
}

pub struct PredictionFeatureBuilder {
    min_sales: usize,
}

impl PredictionFeatureBuilder {
    pub fn new() -> Self {
        Self {
            min_sales: MIN_MONTH_SALES,
        }
    }

    /// One row per (prefix, month), ordered by prefix then month
    pub fn build(&self, sales: &[Sale]) -> Vec<PrefixMonthStats> {
        let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
        for sale in sales {
            if let Some(ppa) = sale.price_per_area().filter(|ppa| *ppa > 0.0) {
                groups
                    .entry((sale.postcode_prefix(), sale.settlement_month()))
                    .or_default()
                    .push(ppa);
            }
        }

        groups
            .into_iter()
            .filter(|(_, vals)| vals.len() >= self.min_sales)
            .map(|((prefix, month), vals)| {
                let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
                let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                PrefixMonthStats {
                    postcode_prefix: prefix.to_string(),
                    month: month.to_string(),
                    sales_count: vals.len(),
                    avg_price_per_area: vals.iter().sum::<f64>() / vals.len() as f64,
                    min_price_per_area: min,
                    max_price_per_area: max,
                }
            })
            .collect()
    }
}

impl Default for PredictionFeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sale(id: &str, postcode: &str, date: &str, price: i64, area: f64) -> Sale {
        Sale::new(id, "TEST", postcode, price, area, date)
    }

    #[test]
    fn test_monthly_groups() {
        let sales = vec![
            make_sale("a", "2150", "20250105", 1000, 1.0),
            make_sale("b", "2151", "20250120", 2000, 1.0),
            make_sale("c", "2152", "20250131", 3000, 1.0),
            make_sale("d", "2150", "20250201", 9999, 1.0),
        ];

        let rows = PredictionFeatureBuilder::new().build(&sales);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.postcode_prefix, "215");
        assert_eq!(row.month, "202501");
        assert_eq!(row.sales_count, 3);
        assert_eq!(row.avg_price_per_area, 2000.0);
        assert_eq!(row.min_price_per_area, 1000.0);
        assert_eq!(row.max_price_per_area, 3000.0);
    }

    #[test]
    fn test_ordering_by_prefix_then_month() {
        let mut sales = Vec::new();
        for (i, (postcode, date)) in [
            ("2770", "20250301"),
            ("2150", "20250401"),
            ("2150", "20240901"),
        ]
        .iter()
        .enumerate()
        {
            for j in 0..3 {
                sales.push(make_sale(&format!("{}-{}", i, j), postcode, date, 500, 2.0));
            }
        }

        let rows = PredictionFeatureBuilder::new().build(&sales);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.postcode_prefix.as_str(), r.month.as_str()))
            .collect();
        assert_eq!(keys, vec![("215", "202409"), ("215", "202504"), ("277", "202503")]);
    }

    #[test]
    fn test_unknown_area_excluded() {
        let sales = vec![
            make_sale("a", "2000", "20250101", 1000, 0.0),
            make_sale("b", "2000", "20250102", 1000, 0.0),
            make_sale("c", "2000", "20250103", 1000, 10.0),
        ];

        assert!(PredictionFeatureBuilder::new().build(&sales).is_empty());
    }
}
