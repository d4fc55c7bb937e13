//! Per-suburb market statistics with year-over-year growth

use super::sale::{Sale, SuburbKey};
use super::stats::{round_half_up, upper_median};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum current-period sales before a suburb gets a row
pub const MIN_SUBURB_SALES: usize = 5;

/// Derived statistics for one (suburb, postcode) group.
///
/// Rebuilt wholesale on every aggregation run; `momentum_score` stays
/// `None` until [`MomentumScorer`](super::scorer::MomentumScorer) runs and
/// for suburbs below its sample floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuburbAggregate {
    pub suburb: String,
    pub postcode: String,
    pub sales_count: i64,
    pub total_value: i64,
    pub median_price: i64,
    pub avg_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub avg_price_per_area: Option<i64>,
    pub sales_count_prev_year: i64,
    pub median_price_prev_year: Option<i64>,
    pub growth_pct: f64,
    pub momentum_score: Option<i64>,
}

impl SuburbAggregate {
    pub fn key(&self) -> SuburbKey {
        SuburbKey::new(self.suburb.clone(), self.postcode.clone())
    }
}

pub struct SuburbAggregator {
    min_sales: usize,
}

impl SuburbAggregator {
    pub fn new() -> Self {
        Self::with_min_sales(MIN_SUBURB_SALES)
    }

    pub fn with_min_sales(min_sales: usize) -> Self {
        Self { min_sales }
    }

    /// Build one row per qualifying suburb, ordered by (suburb, postcode).
    ///
    /// `current` and `prior` must already be restricted to their windows.
    pub fn aggregate(&self, current: &[Sale], prior: &[Sale]) -> Vec<SuburbAggregate> {
        let current_groups = group_by_suburb(current);
        let prior_groups = group_by_suburb(prior);

        let aggregates: Vec<SuburbAggregate> = current_groups
            .into_iter()
            .filter(|(_, sales)| sales.len() >= self.min_sales)
            .filter_map(|(key, sales)| {
                let prior_sales = prior_groups.get(&key).map(Vec::as_slice).unwrap_or(&[]);
                summarize(key, &sales, prior_sales)
            })
            .collect();

        log::debug!(
            "📊 Aggregated {} suburbs from {} current / {} prior sales",
            aggregates.len(),
            current.len(),
            prior.len()
        );

        aggregates
    }
}

impl Default for SuburbAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn group_by_suburb(sales: &[Sale]) -> BTreeMap<SuburbKey, Vec<&Sale>> {
    let mut groups: BTreeMap<SuburbKey, Vec<&Sale>> = BTreeMap::new();
    for sale in sales {
        groups.entry(sale.suburb_key()).or_default().push(sale);
    }
    groups
}

fn summarize(key: SuburbKey, sales: &[&Sale], prior: &[&Sale]) -> Option<SuburbAggregate> {
    let mut prices: Vec<i64> = sales.iter().map(|s| s.price).collect();
    prices.sort_unstable();

    let median_price = upper_median(&prices)?;
    let min_price = *prices.first()?;
    let max_price = *prices.last()?;
    let total_value: i64 = prices.iter().sum();
    let avg_price = round_half_up(total_value as f64 / prices.len() as f64) as i64;

    let area_prices: Vec<f64> = sales.iter().filter_map(|s| s.price_per_area()).collect();
    let avg_price_per_area = if area_prices.is_empty() {
        None
    } else {
        let mean = area_prices.iter().sum::<f64>() / area_prices.len() as f64;
        Some(round_half_up(mean) as i64)
    };

    let mut prior_prices: Vec<i64> = prior.iter().map(|s| s.price).collect();
    prior_prices.sort_unstable();
    let median_price_prev_year = upper_median(&prior_prices);

    Some(SuburbAggregate {
        suburb: key.suburb,
        postcode: key.postcode,
        sales_count: prices.len() as i64,
        total_value,
        median_price,
        avg_price,
        min_price,
        max_price,
        avg_price_per_area,
        sales_count_prev_year: prior_prices.len() as i64,
        median_price_prev_year,
        growth_pct: growth_pct(median_price, median_price_prev_year),
        momentum_score: None,
    })
}

/// Median-on-median growth as a percentage with one decimal.
///
/// A missing or non-positive baseline reports 0.0 rather than an unknown value.
pub fn growth_pct(median: i64, prior_median: Option<i64>) -> f64 {
    match prior_median {
        Some(prior) if prior > 0 => {
            round_half_up((median - prior) as f64 * 1000.0 / prior as f64) / 10.0
        }
        _ => 0.0,
    }
}
