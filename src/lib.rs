//! propflow - property sale analytics
//!
//! Suburb statistics with year-over-year growth, momentum scores,
//! price-per-area outliers and monthly prediction features, computed from
//! normalized sale records held in SQLite.

pub mod analytics_core;
pub mod pipeline;
pub mod sqlite_pragma;
