//! Pipeline configuration from environment variables

use crate::analytics_core::detector::DEFAULT_Z_THRESHOLD;
use crate::analytics_core::AnalysisWindows;
use std::env;
use std::error::Error;

const DEFAULT_DB_PATH: &str = "data/propflow.db";
const DEFAULT_CURRENT_START: &str = "20250101";
const DEFAULT_PRIOR_START: &str = "20240101";

/// Configuration for the analytics pipeline
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Current / prior / feature-table cutoffs
    pub windows: AnalysisWindows,

    /// |z| above which a sale is flagged
    pub outlier_threshold: f64,

    /// Max outliers returned per query
    pub outlier_limit: usize,

    /// Max suburbs returned by a ranking query
    pub ranking_limit: usize,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PROPFLOW_DB_PATH` (default: data/propflow.db)
    /// - `CURRENT_PERIOD_START` (default: 20250101)
    /// - `PRIOR_PERIOD_START` (default: 20240101)
    /// - `FEATURE_PERIOD_START` (default: PRIOR_PERIOD_START)
    /// - `OUTLIER_THRESHOLD` (default: 2.0)
    /// - `OUTLIER_LIMIT` (default: 200)
    /// - `RANKING_LIMIT` (default: 500)
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let current_start =
            lookup("CURRENT_PERIOD_START").unwrap_or_else(|| DEFAULT_CURRENT_START.to_string());
        let prior_start =
            lookup("PRIOR_PERIOD_START").unwrap_or_else(|| DEFAULT_PRIOR_START.to_string());
        let feature_start = lookup("FEATURE_PERIOD_START").unwrap_or_else(|| prior_start.clone());

        let windows = AnalysisWindows::from_cutoffs(&current_start, &prior_start, &feature_start)?;

        Ok(Self {
            db_path: lookup("PROPFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),

            windows,

            outlier_threshold: lookup("OUTLIER_THRESHOLD")
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|t| t.is_finite())
                .unwrap_or(DEFAULT_Z_THRESHOLD),

            outlier_limit: lookup("OUTLIER_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(200),

            ranking_limit: lookup("RANKING_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.db_path, "data/propflow.db");
        assert_eq!(config.windows.current.start.as_deref(), Some("20250101"));
        assert_eq!(config.windows.prior.start.as_deref(), Some("20240101"));
        assert_eq!(config.windows.prior.end.as_deref(), Some("20250101"));
        assert_eq!(config.windows.feature.start.as_deref(), Some("20240101"));
        assert_eq!(config.outlier_threshold, 2.0);
        assert_eq!(config.outlier_limit, 200);
        assert_eq!(config.ranking_limit, 500);
    }

    #[test]
    fn test_custom_config() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("PROPFLOW_DB_PATH", "/tmp/test.db"),
            ("CURRENT_PERIOD_START", "20260101"),
            ("PRIOR_PERIOD_START", "20250701"),
            ("FEATURE_PERIOD_START", "20230101"),
            ("OUTLIER_THRESHOLD", "2.5"),
            ("OUTLIER_LIMIT", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/tmp/test.db");
        assert_eq!(config.windows.current.start.as_deref(), Some("20260101"));
        assert_eq!(config.windows.prior.start.as_deref(), Some("20250701"));
        assert_eq!(config.windows.prior.end.as_deref(), Some("20260101"));
        assert_eq!(config.windows.feature.start.as_deref(), Some("20230101"));
        assert_eq!(config.outlier_threshold, 2.5);
        // unparsable values fall back to the default
        assert_eq!(config.outlier_limit, 200);
    }

    #[test]
    fn test_non_finite_threshold_uses_default() {
        for raw in ["NaN", "inf", "-inf"] {
            let config = PipelineConfig::from_lookup(lookup_from(&[("OUTLIER_THRESHOLD", raw)])).unwrap();
            assert_eq!(config.outlier_threshold, 2.0, "OUTLIER_THRESHOLD={}", raw);
        }
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        let result = PipelineConfig::from_lookup(lookup_from(&[("CURRENT_PERIOD_START", "2025-01-01")]));
        assert!(result.is_err());

        // prior period must start before the current one
        let result = PipelineConfig::from_lookup(lookup_from(&[("PRIOR_PERIOD_START", "20250601")]));
        assert!(result.is_err());
    }
}
