//! Momentum scoring for suburb aggregates
//!
//! Ranks qualifying suburbs on growth, volume and (inverted) price, turns
//! each rank into a 0-100 percentile and blends them:
//!
//! ```text
//! momentum = growth_pctl * 0.5 + volume_pctl * 0.3 + inverse_price_pctl * 0.2
//! ```

use super::aggregator::SuburbAggregate;
use super::stats::round_half_up;

/// Suburbs below this many current sales are left unscored
pub const MIN_SCORED_SALES: i64 = 10;

const GROWTH_WEIGHT: f64 = 0.5;
const VOLUME_WEIGHT: f64 = 0.3;
const PRICE_WEIGHT: f64 = 0.2;

pub struct MomentumScorer {
    min_sales: i64,
}

impl MomentumScorer {
    pub fn new() -> Self {
        Self {
            min_sales: MIN_SCORED_SALES,
        }
    }

    /// Write `momentum_score` onto every qualifying aggregate.
    ///
    /// Rows below the sample floor are reset to `None`. Returns the number
    /// of rows scored.
    pub fn score(&self, aggregates: &mut [SuburbAggregate]) -> usize {
        for agg in aggregates.iter_mut() {
            agg.momentum_score = None;
        }

        let eligible: Vec<usize> = aggregates
            .iter()
            .enumerate()
            .filter(|(_, agg)| agg.sales_count >= self.min_sales)
            .map(|(idx, _)| idx)
            .collect();

        if eligible.is_empty() {
            return 0;
        }

        let mut growth: Vec<f64> = eligible.iter().map(|&i| aggregates[i].growth_pct).collect();
        growth.sort_by(|a, b| a.total_cmp(b));

        let mut volume: Vec<i64> = eligible.iter().map(|&i| aggregates[i].sales_count).collect();
        volume.sort_unstable();

        // Descending so the cheapest suburb lands at the top percentile
        let mut price: Vec<i64> = eligible.iter().map(|&i| aggregates[i].median_price).collect();
        price.sort_unstable_by(|a, b| b.cmp(a));

        for &i in &eligible {
            let agg = &aggregates[i];
            let growth_pctl = rank_percentile(&growth, &agg.growth_pct);
            let volume_pctl = rank_percentile(&volume, &agg.sales_count);
            let price_pctl = rank_percentile(&price, &agg.median_price);

            let blended = growth_pctl * GROWTH_WEIGHT
                + volume_pctl * VOLUME_WEIGHT
                + price_pctl * PRICE_WEIGHT;

            aggregates[i].momentum_score = Some(round_half_up(blended).clamp(0.0, 100.0) as i64);
        }

        log::debug!("📈 Scored momentum for {} suburbs", eligible.len());

        eligible.len()
    }
}

impl Default for MomentumScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentile (0-100) of `value` within an already sorted list.
///
/// Tied values all take the position of the first equal element. A single
/// element list has no spread and reports 100.
pub fn rank_percentile<T: PartialEq>(sorted: &[T], value: &T) -> f64 {
    if sorted.len() <= 1 {
        return 100.0;
    }
    let idx = sorted.iter().position(|v| v == value).unwrap_or(0);
    round_half_up(idx as f64 / (sorted.len() - 1) as f64 * 100.0)
}
