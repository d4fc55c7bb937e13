//! Sale store: the queryable table behind the analytics pipeline
//!
//! Tables (see `/sql/` directory):
//! - `sales` - normalized sale records, INSERT OR REPLACE on id
//! - `suburb_stats` - derived aggregates, replaced wholesale per run

use crate::analytics_core::{DateWindow, Sale, SuburbAggregate, SuburbKey};
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Embedded schema, executed in order. Every statement is idempotent.
const SCHEMA_MIGRATIONS: &[(&str, &str)] = &[
    ("01_sales.sql", include_str!("../../sql/01_sales.sql")),
    ("02_suburb_stats.sql", include_str!("../../sql/02_suburb_stats.sql")),
];

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::LockPoisoned => write!(f, "Store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Which sales a scan returns. Results are ordered by settlement date, then id.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub window: DateWindow,
    /// Restrict to one suburb (case-insensitive name, exact postcode)
    pub suburb: Option<SuburbKey>,
    /// Only sales with a known area and a positive price-per-area
    pub require_area_price: bool,
}

impl SaleFilter {
    pub fn in_window(window: &DateWindow) -> Self {
        Self {
            window: window.clone(),
            ..Self::default()
        }
    }

    pub fn with_area_price(mut self) -> Self {
        self.require_area_price = true;
        self
    }

    pub fn for_suburb(mut self, key: SuburbKey) -> Self {
        self.suburb = Some(key);
        self
    }

    pub fn matches(&self, sale: &Sale) -> bool {
        if !self.window.contains(&sale.settlement_date) {
            return false;
        }
        if let Some(ref key) = self.suburb {
            if !key.matches(&sale.suburb, &sale.postcode) {
                return false;
            }
        }
        !self.require_area_price || (sale.land_area > 0.0 && sale.has_area_price())
    }
}

/// Storage collaborator for the analytics pipeline.
///
/// `replace_aggregates` must be all-or-nothing: readers see either the
/// previous snapshot or the new one, never a mix.
pub trait SaleStore: Send + Sync {
    /// Insert or replace sales by id. Returns the number written.
    fn insert_sales(&self, sales: &[Sale]) -> Result<usize, StoreError>;

    fn scan_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, StoreError>;

    /// Swap the whole aggregate table for `snapshot`
    fn replace_aggregates(&self, snapshot: Vec<SuburbAggregate>) -> Result<(), StoreError>;

    /// All aggregates ordered by (suburb, postcode)
    fn load_aggregates(&self) -> Result<Vec<SuburbAggregate>, StoreError>;

    fn sales_count(&self) -> Result<u64, StoreError>;
}

/// Run the embedded schema migrations against `conn`
pub fn run_schema_migrations(conn: &Connection) -> Result<(), StoreError> {
    log::info!("🔧 Running schema migrations");

    for (name, sql) in SCHEMA_MIGRATIONS {
        log::debug!("   ├─ Executing: {}", name);
        conn.execute_batch(sql)?;
    }

    log::info!("✅ Schema ready ({} migrations)", SCHEMA_MIGRATIONS.len());
    Ok(())
}

/// SQLite-backed sale store
pub struct SqliteSaleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSaleStore {
    /// Open (or create) the database file and bring the schema up to date
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path.as_ref())?;
        apply_optimized_pragmas(&conn)?;
        run_schema_migrations(&conn)?;

        log::info!("📂 Sale store opened: {}", db_path.as_ref().display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        run_schema_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_sale(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sale> {
        Ok(Sale {
            id: row.get(0)?,
            suburb: row.get(1)?,
            postcode: row.get(2)?,
            price: row.get(3)?,
            land_area: row.get(4)?,
            settlement_date: row.get(5)?,
            address: row.get(6)?,
            contract_date: row.get(7)?,
            zone_code: row.get(8)?,
            property_type: row.get(9)?,
            property_id: row.get(10)?,
            property_desc: row.get(11)?,
            source_file: row.get(12)?,
        })
    }

    fn row_to_aggregate(row: &rusqlite::Row<'_>) -> rusqlite::Result<SuburbAggregate> {
        Ok(SuburbAggregate {
            suburb: row.get(0)?,
            postcode: row.get(1)?,
            sales_count: row.get(2)?,
            total_value: row.get(3)?,
            median_price: row.get(4)?,
            avg_price: row.get(5)?,
            min_price: row.get(6)?,
            max_price: row.get(7)?,
            avg_price_per_area: row.get(8)?,
            sales_count_prev_year: row.get(9)?,
            median_price_prev_year: row.get(10)?,
            growth_pct: row.get(11)?,
            momentum_score: row.get(12)?,
        })
    }
}

impl SaleStore for SqliteSaleStore {
    fn insert_sales(&self, sales: &[Sale]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO sales (
                    id, address, suburb, postcode, price, land_area,
                    contract_date, settlement_date, zone_code, property_type,
                    property_id, property_desc, source_file, price_per_area
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for sale in sales {
                stmt.execute(params![
                    sale.id,
                    sale.address,
                    sale.suburb,
                    sale.postcode,
                    sale.price,
                    sale.land_area,
                    sale.contract_date,
                    sale.settlement_date,
                    sale.zone_code,
                    sale.property_type,
                    sale.property_id,
                    sale.property_desc,
                    sale.source_file,
                    sale.price_per_area(),
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("📥 Inserted {} sales", sales.len());
        Ok(sales.len())
    }

    fn scan_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(ref start) = filter.window.start {
            clauses.push("settlement_date >= ?");
            values.push(start.clone());
        }
        if let Some(ref end) = filter.window.end {
            clauses.push("settlement_date < ?");
            values.push(end.clone());
        }
        if let Some(ref key) = filter.suburb {
            clauses.push("UPPER(suburb) = UPPER(?) AND postcode = ?");
            values.push(key.suburb.clone());
            values.push(key.postcode.clone());
        }
        if filter.require_area_price {
            clauses.push("price_per_area IS NOT NULL AND price_per_area > 0 AND land_area > 0");
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT id, suburb, postcode, price, land_area, settlement_date,
                    address, contract_date, zone_code, property_type,
                    property_id, property_desc, source_file
             FROM sales
             {}
             ORDER BY settlement_date ASC, id ASC",
            where_sql
        );

        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(&sql)?;
        let sales = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_sale)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sales)
    }

    /// DELETE + bulk INSERT inside one transaction
    fn replace_aggregates(&self, snapshot: Vec<SuburbAggregate>) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM suburb_stats", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO suburb_stats (
                    suburb, postcode, sales_count, total_value,
                    median_price, avg_price, min_price, max_price,
                    avg_price_per_area, sales_count_prev_year,
                    median_price_prev_year, growth_pct, momentum_score
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for agg in &snapshot {
                stmt.execute(params![
                    agg.suburb,
                    agg.postcode,
                    agg.sales_count,
                    agg.total_value,
                    agg.median_price,
                    agg.avg_price,
                    agg.min_price,
                    agg.max_price,
                    agg.avg_price_per_area,
                    agg.sales_count_prev_year,
                    agg.median_price_prev_year,
                    agg.growth_pct,
                    agg.momentum_score,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("💾 Replaced suburb_stats with {} rows", snapshot.len());
        Ok(())
    }

    fn load_aggregates(&self) -> Result<Vec<SuburbAggregate>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT suburb, postcode, sales_count, total_value,
                   median_price, avg_price, min_price, max_price,
                   avg_price_per_area, sales_count_prev_year,
                   median_price_prev_year, growth_pct, momentum_score
            FROM suburb_stats
            ORDER BY suburb ASC, postcode ASC
            "#,
        )?;

        let aggregates = stmt
            .query_map([], Self::row_to_aggregate)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(aggregates)
    }

    fn sales_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
