//! Small numeric helpers shared by the aggregator, scorer and detector

/// Round half toward positive infinity (`-2.5 -> -2`, `2.5 -> 3`).
///
/// Every rounded figure the engine publishes goes through this so that
/// negative growth and deviation values round the same way as positive ones.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Element at index `n / 2` of an ascending slice.
///
/// For even `n` this is the upper of the two middle elements, not their mean.
pub fn upper_median(sorted: &[i64]) -> Option<i64> {
    sorted.get(sorted.len() / 2).copied()
}

/// Mean and population standard deviation (variance divided by N).
pub fn mean_std(vals: &[f64]) -> (f64, f64) {
    if vals.is_empty() {
        return (0.0, 0.0);
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let sq_diff: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sq_diff / n).sqrt())
}
