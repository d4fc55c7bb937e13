//! # Market Pipeline
//!
//! Storage and orchestration around the analytics core:
//! - Persists normalized sales (`sales` table or in-memory map)
//! - Rebuilds the `suburb_stats` snapshot on demand
//! - Serves ranking, drill-down, outlier and feature queries
//!
//! ## Write path
//!
//! There is exactly one writer: [`MarketEngine::compute_suburb_aggregates`].
//! It scans the current and prior windows, aggregates, scores momentum in
//! memory and hands the finished table to [`SaleStore::replace_aggregates`],
//! which swaps it in atomically. Readers see either the previous snapshot
//! or the new one, never a half-written table.
//!
//! ## Schema Reference
//!
//! Tables are defined in `/sql/`:
//! - `sales` → `Sale`
//! - `suburb_stats` → `SuburbAggregate`
//!
//! ## Module Organization
//!
//! - `config` - Environment-driven settings
//! - `db` - Store trait, filters and the SQLite implementation
//! - `memory` - In-memory store
//! - `engine` - Operations exposed to the CLI

pub mod config;
pub mod db;
pub mod engine;
pub mod memory;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use db::{SaleFilter, SaleStore, SqliteSaleStore, StoreError};
pub use engine::{AggregationSummary, MarketEngine, RankKey, SortDirection, SuburbDetail};
pub use memory::InMemorySaleStore;
