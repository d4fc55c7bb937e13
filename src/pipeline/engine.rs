//! Market Engine - orchestration layer over the sale store
//!
//! ```text
//! SaleStore ──scan──► SuburbAggregator ──► MomentumScorer ──replace──► SaleStore
//!     │
//!     ├──scan──► OutlierDetector ──► OutlierReport
//!     └──scan──► PredictionFeatureBuilder ──► Vec<PrefixMonthStats>
//! ```
//!
//! The rebuild path is the only writer. Every read operation recomputes
//! from source sales or reads the current aggregate snapshot; nothing is
//! cached between calls.

use super::db::{SaleFilter, SaleStore, StoreError};
use crate::analytics_core::trend::{monthly_price_trend, recent_sales, RECENT_SALES_LIMIT};
use crate::analytics_core::{
    AnalysisWindows, MomentumScorer, MonthlyPriceTrend, OutlierDetector, OutlierReport,
    PredictionFeatureBuilder, PrefixMonthStats, Sale, SuburbAggregate, SuburbAggregator,
    SuburbKey,
};
use serde::Serialize;
use std::cmp::Ordering;

/// Max rows returned by [`MarketEngine::search_suburbs`]
pub const SEARCH_LIMIT: usize = 20;

/// Columns a suburb ranking can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    MedianPrice,
    SalesCount,
    GrowthPct,
    AvgPricePerArea,
    TotalValue,
    MomentumScore,
}

impl RankKey {
    /// Unknown names fall back to `MedianPrice`
    pub fn parse(s: &str) -> Self {
        match s {
            "sales_count" => RankKey::SalesCount,
            "growth_pct" | "growth_1yr" => RankKey::GrowthPct,
            "avg_price_per_area" | "avg_price_per_sqm" => RankKey::AvgPricePerArea,
            "total_value" => RankKey::TotalValue,
            "momentum_score" => RankKey::MomentumScore,
            _ => RankKey::MedianPrice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankKey::MedianPrice => "median_price",
            RankKey::SalesCount => "sales_count",
            RankKey::GrowthPct => "growth_pct",
            RankKey::AvgPricePerArea => "avg_price_per_area",
            RankKey::TotalValue => "total_value",
            RankKey::MomentumScore => "momentum_score",
        }
    }

    fn value(&self, agg: &SuburbAggregate) -> Option<f64> {
        match self {
            RankKey::MedianPrice => Some(agg.median_price as f64),
            RankKey::SalesCount => Some(agg.sales_count as f64),
            RankKey::GrowthPct => Some(agg.growth_pct),
            RankKey::AvgPricePerArea => agg.avg_price_per_area.map(|v| v as f64),
            RankKey::TotalValue => Some(agg.total_value as f64),
            RankKey::MomentumScore => agg.momentum_score.map(|v| v as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than "ASC" (any case) sorts descending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregationSummary {
    pub suburbs: usize,
    pub scored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuburbDetail {
    pub aggregate: SuburbAggregate,
    pub recent_sales: Vec<Sale>,
    pub monthly_trend: Vec<MonthlyPriceTrend>,
}

pub struct MarketEngine<S: SaleStore> {
    store: S,
    windows: AnalysisWindows,
    aggregator: SuburbAggregator,
    scorer: MomentumScorer,
    features: PredictionFeatureBuilder,
}

impl<S: SaleStore> MarketEngine<S> {
    /// `windows` drives the read-side queries (outliers use `current`, the
    /// feature table uses `feature`).
    pub fn new(store: S, windows: AnalysisWindows) -> Self {
        Self {
            store,
            windows,
            aggregator: SuburbAggregator::new(),
            scorer: MomentumScorer::new(),
            features: PredictionFeatureBuilder::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn windows(&self) -> &AnalysisWindows {
        &self.windows
    }

    /// Bulk-load normalized sales (insert or replace by id).
    ///
    /// Records without a positive price are transfers, not market sales,
    /// and are skipped.
    pub fn ingest_sales(&self, sales: &[Sale]) -> Result<usize, StoreError> {
        let priced: Vec<Sale> = sales.iter().filter(|s| s.price > 0).cloned().collect();
        let skipped = sales.len() - priced.len();
        if skipped > 0 {
            log::warn!("⚠️  Skipped {} sales without a positive price", skipped);
        }

        let written = self.store.insert_sales(&priced)?;
        log::info!("📥 Ingested {} sales", written);
        Ok(written)
    }

    /// Rebuild the suburb table for the given windows, score momentum and
    /// swap the result in as one snapshot.
    pub fn compute_suburb_aggregates(
        &self,
        windows: &AnalysisWindows,
    ) -> Result<AggregationSummary, StoreError> {
        let current = self.store.scan_sales(&SaleFilter::in_window(&windows.current))?;
        let prior = self.store.scan_sales(&SaleFilter::in_window(&windows.prior))?;

        let mut aggregates = self.aggregator.aggregate(&current, &prior);
        let scored = self.scorer.score(&mut aggregates);
        let suburbs = aggregates.len();

        self.store.replace_aggregates(aggregates)?;

        log::info!("✅ Calculated stats for {} suburbs", suburbs);
        log::info!("✅ Calculated momentum scores for {} suburbs", scored);

        Ok(AggregationSummary { suburbs, scored })
    }

    /// Aggregates ordered by `key`. Missing values sort lowest.
    pub fn rank_suburbs(
        &self,
        key: RankKey,
        direction: SortDirection,
        limit: usize,
    ) -> Result<Vec<SuburbAggregate>, StoreError> {
        let mut rows = self.store.load_aggregates()?;

        rows.sort_by(|a, b| {
            let ord = compare_nullable(key.value(a), key.value(b));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        rows.truncate(limit);

        log::debug!("🏆 Ranked {} suburbs by {}", rows.len(), key.as_str());
        Ok(rows)
    }

    /// Aggregate, latest sales and monthly trend for one suburb.
    ///
    /// `None` when the suburb has no aggregate row.
    pub fn suburb_detail(
        &self,
        suburb: &str,
        postcode: &str,
    ) -> Result<Option<SuburbDetail>, StoreError> {
        let aggregate = match self
            .store
            .load_aggregates()?
            .into_iter()
            .find(|agg| agg.key().matches(suburb, postcode))
        {
            Some(agg) => agg,
            None => return Ok(None),
        };

        let filter = SaleFilter::default().for_suburb(SuburbKey::new(suburb, postcode));
        let sales = self.store.scan_sales(&filter)?;

        Ok(Some(SuburbDetail {
            aggregate,
            recent_sales: recent_sales(&sales, RECENT_SALES_LIMIT),
            monthly_trend: monthly_price_trend(&sales),
        }))
    }

    /// Every sale in the current window, newest settlement first
    pub fn current_sales(&self) -> Result<Vec<Sale>, StoreError> {
        let mut sales = self.store.scan_sales(&SaleFilter::in_window(&self.windows.current))?;
        sales.sort_by(|a, b| b.settlement_date.cmp(&a.settlement_date));
        Ok(sales)
    }

    /// Outliers in the current window
    pub fn detect_outliers(&self, threshold: f64, limit: usize) -> Result<OutlierReport, StoreError> {
        let filter = SaleFilter::in_window(&self.windows.current).with_area_price();
        let sales = self.store.scan_sales(&filter)?;

        let report = OutlierDetector::new(threshold).detect(&sales, limit);

        log::info!(
            "🔎 Outliers: {} total ({} underpriced, {} overpriced) from {} sales",
            report.total_count,
            report.underpriced_count,
            report.overpriced_count,
            sales.len()
        );

        Ok(report)
    }

    /// Monthly prefix feature table over the feature window
    pub fn build_prediction_features(&self) -> Result<Vec<PrefixMonthStats>, StoreError> {
        let filter = SaleFilter::in_window(&self.windows.feature).with_area_price();
        let sales = self.store.scan_sales(&filter)?;

        let rows = self.features.build(&sales);
        log::info!("🧮 Built {} prefix-month feature rows", rows.len());
        Ok(rows)
    }

    /// Substring match on suburb or postcode, busiest suburbs first.
    ///
    /// Queries shorter than two characters return nothing.
    pub fn search_suburbs(&self, query: &str) -> Result<Vec<SuburbAggregate>, StoreError> {
        let needle = query.trim().to_ascii_uppercase();
        if needle.chars().count() < 2 {
            return Ok(Vec::new());
        }

        let mut rows: Vec<SuburbAggregate> = self
            .store
            .load_aggregates()?
            .into_iter()
            .filter(|agg| {
                agg.suburb.to_ascii_uppercase().contains(&needle) || agg.postcode.contains(&needle)
            })
            .collect();

        rows.sort_by(|a, b| b.sales_count.cmp(&a.sales_count));
        rows.truncate(SEARCH_LIMIT);
        Ok(rows)
    }

    pub fn sales_count(&self) -> Result<u64, StoreError> {
        self.store.sales_count()
    }
}

fn compare_nullable(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
