//! Price-per-area outlier detection against postcode-prefix baselines

use super::sale::Sale;
use super::stats::{mean_std, round_half_up};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Prefix groups smaller than this have no usable distribution
pub const MIN_PREFIX_SAMPLES: usize = 5;

pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierType {
    Underpriced,
    Overpriced,
}

/// Price-per-area distribution of one postcode prefix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefixPriceStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRecord {
    #[serde(flatten)]
    pub sale: Sale,
    pub postcode_prefix: String,
    pub price_per_area: f64,
    pub expected_price_per_area: f64,
    pub z_score: f64,
    pub outlier_type: OutlierType,
    pub deviation_pct: i64,
}

/// Outliers for one query.
///
/// The counts cover every flagged sale; `outliers` is cut to the limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub outliers: Vec<OutlierRecord>,
    pub total_count: usize,
    pub underpriced_count: usize,
    pub overpriced_count: usize,
    pub prefix_stats: BTreeMap<String, PrefixPriceStats>,
}

pub struct OutlierDetector {
    threshold: f64,
    min_samples: usize,
}

impl OutlierDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            min_samples: MIN_PREFIX_SAMPLES,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }

    /// Mean and population std per prefix, for prefixes with enough samples.
    ///
    /// Only sales with a positive area and price-per-area count.
    pub fn prefix_stats(&self, sales: &[Sale]) -> BTreeMap<String, PrefixPriceStats> {
        let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for sale in sales.iter().filter(|s| qualifies(s)) {
            if let Some(ppa) = sale.price_per_area() {
                values.entry(sale.postcode_prefix()).or_default().push(ppa);
            }
        }

        values
            .into_iter()
            .filter(|(_, vals)| vals.len() >= self.min_samples)
            .map(|(prefix, vals)| {
                let (mean, std) = mean_std(&vals);
                (
                    prefix.to_string(),
                    PrefixPriceStats {
                        mean,
                        std,
                        count: vals.len(),
                    },
                )
            })
            .collect()
    }

    /// Flag sales whose |z| exceeds the threshold.
    ///
    /// Sorted by |z| descending (ties keep input order) and truncated to
    /// `limit`. Prefixes with zero spread produce no outliers.
    pub fn detect(&self, sales: &[Sale], limit: usize) -> OutlierReport {
        let prefix_stats = self.prefix_stats(sales);

        let mut outliers: Vec<OutlierRecord> = sales
            .iter()
            .filter(|s| qualifies(s))
            .filter_map(|sale| {
                let ppa = sale.price_per_area()?;
                let stats = prefix_stats.get(sale.postcode_prefix())?;
                if stats.std == 0.0 {
                    return None;
                }

                let z_score = (ppa - stats.mean) / stats.std;
                // strictly greater; a NaN threshold flags nothing
                if z_score.abs().partial_cmp(&self.threshold) != Some(Ordering::Greater) {
                    return None;
                }

                let outlier_type = if z_score < 0.0 {
                    OutlierType::Underpriced
                } else {
                    OutlierType::Overpriced
                };

                Some(OutlierRecord {
                    sale: sale.clone(),
                    postcode_prefix: sale.postcode_prefix().to_string(),
                    price_per_area: ppa,
                    expected_price_per_area: stats.mean,
                    z_score,
                    outlier_type,
                    deviation_pct: round_half_up((ppa - stats.mean) / stats.mean * 100.0) as i64,
                })
            })
            .collect();

        outliers.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));

        let underpriced_count = outliers
            .iter()
            .filter(|o| o.outlier_type == OutlierType::Underpriced)
            .count();
        let total_count = outliers.len();

        log::debug!(
            "🔎 {} outliers across {} prefixes (threshold {})",
            total_count,
            prefix_stats.len(),
            self.threshold
        );

        outliers.truncate(limit);

        OutlierReport {
            outliers,
            total_count,
            underpriced_count,
            overpriced_count: total_count - underpriced_count,
            prefix_stats,
        }
    }
}

fn qualifies(sale: &Sale) -> bool {
    sale.land_area > 0.0 && sale.has_area_price()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sales with area 1.0 so price-per-area equals price
    fn make_prefix_sales(postcode: &str, prices: &[i64]) -> Vec<Sale> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                Sale::new(format!("{}-{}", postcode, i), "TEST", postcode, price, 1.0, "20250301")
            })
            .collect()
    }

    #[test]
    fn test_flags_high_outlier_below_threshold() {
        let sales = make_prefix_sales("2150", &[100, 100, 100, 100, 500]);

        let report = OutlierDetector::new(1.9).detect(&sales, 100);
        assert_eq!(report.total_count, 1);

        let outlier = &report.outliers[0];
        assert_eq!(outlier.sale.price, 500);
        assert_eq!(outlier.postcode_prefix, "215");
        assert_eq!(outlier.expected_price_per_area, 180.0);
        assert!((outlier.z_score - 2.0).abs() < 1e-9);
        assert_eq!(outlier.outlier_type, OutlierType::Overpriced);
        assert_eq!(outlier.deviation_pct, 178);

        let stats = &report.prefix_stats["215"];
        assert_eq!(stats.mean, 180.0);
        assert_eq!(stats.std, 160.0);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_not_flagged_above_threshold() {
        let sales = make_prefix_sales("2150", &[100, 100, 100, 100, 500]);

        let report = OutlierDetector::new(2.1).detect(&sales, 100);
        assert_eq!(report.total_count, 0);
        assert!(report.outliers.is_empty());
        assert!(report.prefix_stats.contains_key("215"));
    }

    #[test]
    fn test_nan_threshold_flags_nothing() {
        let sales = make_prefix_sales("2150", &[100, 101, 102, 103, 104, 105]);

        let report = OutlierDetector::new(f64::NAN).detect(&sales, 100);
        assert!(report.prefix_stats["215"].std > 0.0);
        assert_eq!(report.total_count, 0);
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_underpriced_classification() {
        let sales = make_prefix_sales("2770", &[500, 500, 500, 500, 100]);

        let report = OutlierDetector::new(1.9).detect(&sales, 100);
        assert_eq!(report.underpriced_count, 1);
        assert_eq!(report.overpriced_count, 0);
        assert_eq!(report.outliers[0].outlier_type, OutlierType::Underpriced);
        // mean 420: (100 - 420) / 420 = -76.19%
        assert_eq!(report.outliers[0].deviation_pct, -76);
    }

    #[test]
    fn test_small_prefixes_excluded() {
        let mut sales = make_prefix_sales("2150", &[100, 100, 100, 100, 500]);
        sales.extend(make_prefix_sales("2770", &[100, 100, 100, 9000]));

        let report = OutlierDetector::new(1.0).detect(&sales, 100);
        assert!(!report.prefix_stats.contains_key("277"));
        assert!(report.outliers.iter().all(|o| o.postcode_prefix != "277"));
    }

    #[test]
    fn test_zero_variance_prefix_skipped() {
        let sales = make_prefix_sales("2000", &[700, 700, 700, 700, 700, 700]);

        let report = OutlierDetector::new(0.0).detect(&sales, 100);
        assert_eq!(report.prefix_stats["200"].std, 0.0);
        assert_eq!(report.total_count, 0);
    }

    #[test]
    fn test_sales_without_area_ignored() {
        let mut sales = make_prefix_sales("2150", &[100, 100, 100, 100]);
        sales.push(Sale::new("no-area", "TEST", "2150", 10_000_000, 0.0, "20250301"));

        let report = OutlierDetector::with_defaults().detect(&sales, 100);
        assert!(report.prefix_stats.is_empty());
        assert_eq!(report.total_count, 0);
    }

    #[test]
    fn test_counts_cover_truncated_results() {
        // 20 baseline sales and 3 expensive extremes; the cheap pair stays within 1.5 std
        let mut prices = vec![1000; 20];
        prices.extend([5000, 5200, 5400, 10, 20]);
        let sales = make_prefix_sales("2100", &prices);

        let report = OutlierDetector::new(1.5).detect(&sales, 2);
        assert_eq!(report.outliers.len(), 2);
        assert_eq!(report.total_count, 3);
        assert_eq!(
            report.underpriced_count + report.overpriced_count,
            report.total_count
        );
        assert!(report.outliers[0].z_score.abs() >= report.outliers[1].z_score.abs());
        assert_eq!(report.outliers[0].sale.price, 5400);
    }
}
