//! Analytics Core - suburb statistics, momentum and outlier derivation
//!
//! Pure, synchronous computations over already-normalized sales. Nothing
//! in here touches storage; the pipeline layer scans the store and feeds
//! the results in.
//!
//! # Architecture
//!
//! ```text
//! SaleStore scan (current + prior windows)
//!     ↓
//! SuburbAggregator (median, averages, growth per suburb)
//!     ↓
//! MomentumScorer (growth / volume / inverse price percentiles)
//!     ↓
//! SaleStore::replace_aggregates (atomic snapshot swap)
//!
//! SaleStore scan (current window) → OutlierDetector (prefix z-scores)
//! SaleStore scan (feature window) → PredictionFeatureBuilder (prefix × month)
//! ```

pub mod aggregator;
pub mod detector;
pub mod features;
pub mod sale;
pub mod scorer;
pub mod stats;
pub mod trend;
pub mod window;

pub use aggregator::{SuburbAggregate, SuburbAggregator};
pub use detector::{OutlierDetector, OutlierRecord, OutlierReport, OutlierType, PrefixPriceStats};
pub use features::{PredictionFeatureBuilder, PrefixMonthStats};
pub use sale::{Sale, SuburbKey};
pub use scorer::MomentumScorer;
pub use trend::MonthlyPriceTrend;
pub use window::{AnalysisWindows, DateWindow, WindowError};
