//! propflow - Market analytics CLI
//!
//! Imports normalized sales and answers suburb, outlier and feature queries
//! against the SQLite store.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin propflow -- import sales.jsonl
//! cargo run --release --bin propflow -- aggregate
//! cargo run --release --bin propflow -- rank --sort momentum_score --order DESC --limit 20
//! cargo run --release --bin propflow -- detail RYDE 2112
//! cargo run --release --bin propflow -- sales
//! cargo run --release --bin propflow -- outliers --threshold 2.5 --limit 50
//! cargo run --release --bin propflow -- features
//! cargo run --release --bin propflow -- search epp
//! cargo run --release --bin propflow -- stats
//! ```
//!
//! ## Environment Variables
//!
//! - PROPFLOW_DB_PATH - SQLite database path (default: data/propflow.db)
//! - CURRENT_PERIOD_START - First day of the current period (default: 20250101)
//! - PRIOR_PERIOD_START - First day of the prior period (default: 20240101)
//! - FEATURE_PERIOD_START - First day of the feature table (default: PRIOR_PERIOD_START)
//! - OUTLIER_THRESHOLD - |z| cutoff (default: 2.0)
//! - OUTLIER_LIMIT - Max outliers returned (default: 200)
//! - RANKING_LIMIT - Max suburbs ranked (default: 500)
//! - RUST_LOG - Logging level (optional, default: info)

use propflow::analytics_core::Sale;
use propflow::pipeline::{
    MarketEngine, PipelineConfig, RankKey, SaleStore, SortDirection, SqliteSaleStore,
};
use serde::Serialize;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const USAGE: &str = "usage: propflow <import FILE | aggregate | rank | detail SUBURB POSTCODE | sales | outliers | features | search QUERY | stats>";

/// Value following `--flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|x| x == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a JSONL file of sales, skipping lines that fail to parse
fn read_sales(path: &Path) -> Result<Vec<Sale>, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut sales = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match Sale::from_jsonl(&line) {
            Ok(sale) => sales.push(sale),
            Err(e) => {
                skipped += 1;
                log::warn!("Failed to parse sale at line {}: {}", line_no + 1, e);
            }
        }
    }

    if skipped > 0 {
        log::warn!("⚠️  Skipped {} malformed lines", skipped);
    }
    Ok(sales)
}

fn run<S: SaleStore>(
    engine: &MarketEngine<S>,
    config: &PipelineConfig,
    args: &[String],
) -> Result<(), Box<dyn Error>> {
    let command = args.first().map(|s| s.as_str()).unwrap_or("");

    match command {
        "import" => {
            let path = args.get(1).ok_or(USAGE)?;
            let sales = read_sales(Path::new(path))?;
            engine.ingest_sales(&sales)?;
            let summary = engine.compute_suburb_aggregates(&config.windows)?;
            print_json(&summary)?;
        }
        "aggregate" => {
            let summary = engine.compute_suburb_aggregates(&config.windows)?;
            print_json(&summary)?;
        }
        "rank" => {
            let key = RankKey::parse(flag_value(args, "--sort").unwrap_or("median_price"));
            let direction = SortDirection::parse(flag_value(args, "--order").unwrap_or("DESC"));
            let limit = parse_flag(args, "--limit", config.ranking_limit);
            print_json(&engine.rank_suburbs(key, direction, limit)?)?;
        }
        "detail" => {
            let suburb = args.get(1).ok_or(USAGE)?;
            let postcode = args.get(2).ok_or(USAGE)?;
            match engine.suburb_detail(suburb, postcode)? {
                Some(detail) => print_json(&detail)?,
                None => return Err(format!("Suburb not found: {} {}", suburb, postcode).into()),
            }
        }
        "sales" => {
            print_json(&engine.current_sales()?)?;
        }
        "outliers" => {
            let threshold = parse_flag(args, "--threshold", config.outlier_threshold);
            if !threshold.is_finite() {
                return Err(format!("--threshold must be a finite number, got {}", threshold).into());
            }
            let limit = parse_flag(args, "--limit", config.outlier_limit);
            print_json(&engine.detect_outliers(threshold, limit)?)?;
        }
        "features" => {
            print_json(&engine.build_prediction_features()?)?;
        }
        "search" => {
            let query = args.get(1).ok_or(USAGE)?;
            print_json(&engine.search_suburbs(query)?)?;
        }
        "stats" => {
            let suburbs = engine.store().load_aggregates()?.len();
            print_json(&serde_json::json!({
                "total_sales": engine.sales_count()?,
                "total_suburbs": suburbs,
                "windows": engine.windows(),
            }))?;
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = PipelineConfig::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();

    log::info!("🚀 Starting propflow");
    log::info!("   Database: {}", config.db_path);
    log::info!("   Current period: {:?}", config.windows.current.start);
    log::info!("   Prior period: {:?}", config.windows.prior.start);

    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SqliteSaleStore::open(&config.db_path)?;
    let engine = MarketEngine::new(store, config.windows.clone());

    run(&engine, &config, &args)
}
