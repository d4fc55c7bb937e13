//! In-memory sale store
//!
//! Aggregates live behind an `Arc` snapshot: a rebuild prepares the new
//! vector off to the side and swaps the pointer under a short write lock,
//! so readers holding the old `Arc` keep a consistent view.

use super::db::{SaleFilter, SaleStore, StoreError};
use crate::analytics_core::{Sale, SuburbAggregate};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct InMemorySaleStore {
    sales: RwLock<BTreeMap<String, Sale>>,
    aggregates: RwLock<Arc<Vec<SuburbAggregate>>>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current aggregate snapshot without copying it
    pub fn snapshot(&self) -> Result<Arc<Vec<SuburbAggregate>>, StoreError> {
        let guard = self.aggregates.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(&guard))
    }
}

impl SaleStore for InMemorySaleStore {
    fn insert_sales(&self, sales: &[Sale]) -> Result<usize, StoreError> {
        let mut guard = self.sales.write().map_err(|_| StoreError::LockPoisoned)?;
        for sale in sales {
            guard.insert(sale.id.clone(), sale.clone());
        }
        Ok(sales.len())
    }

    fn scan_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, StoreError> {
        let guard = self.sales.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut sales: Vec<Sale> = guard.values().filter(|s| filter.matches(s)).cloned().collect();
        // BTreeMap already yields id order; a stable sort keeps it within a date
        sales.sort_by(|a, b| a.settlement_date.cmp(&b.settlement_date));
        Ok(sales)
    }

    fn replace_aggregates(&self, mut snapshot: Vec<SuburbAggregate>) -> Result<(), StoreError> {
        snapshot.sort_by(|a, b| (&a.suburb, &a.postcode).cmp(&(&b.suburb, &b.postcode)));
        let fresh = Arc::new(snapshot);

        let mut guard = self.aggregates.write().map_err(|_| StoreError::LockPoisoned)?;
        *guard = fresh;
        Ok(())
    }

    fn load_aggregates(&self) -> Result<Vec<SuburbAggregate>, StoreError> {
        Ok(self.snapshot()?.as_ref().clone())
    }

    fn sales_count(&self) -> Result<u64, StoreError> {
        let guard = self.sales.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics_core::{DateWindow, SuburbKey};

    fn make_aggregate(suburb: &str) -> SuburbAggregate {
        SuburbAggregate {
            suburb: suburb.to_string(),
            postcode: "2000".to_string(),
            sales_count: 5,
            total_value: 500,
            median_price: 100,
            avg_price: 100,
            min_price: 100,
            max_price: 100,
            avg_price_per_area: Some(1),
            sales_count_prev_year: 0,
            median_price_prev_year: None,
            growth_pct: 0.0,
            momentum_score: None,
        }
    }

    #[test]
    fn test_scan_order_and_filters() {
        let store = InMemorySaleStore::new();
        store
            .insert_sales(&[
                Sale::new("b", "RYDE", "2112", 1, 1.0, "20250105"),
                Sale::new("a", "RYDE", "2112", 1, 1.0, "20250105"),
                Sale::new("c", "RYDE", "2112", 1, 0.0, "20250101"),
                Sale::new("d", "EPPING", "2121", 1, 1.0, "20240101"),
            ])
            .unwrap();

        let all: Vec<String> = store
            .scan_sales(&SaleFilter::default())
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(all, vec!["d", "c", "a", "b"]);

        let filter = SaleFilter::in_window(&DateWindow::since("20250101").unwrap())
            .for_suburb(SuburbKey::new("Ryde", "2112"))
            .with_area_price();
        let ids: Vec<String> = store
            .scan_sales(&filter)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let store = InMemorySaleStore::new();
        store.replace_aggregates(vec![make_aggregate("OLD")]).unwrap();

        let held = store.snapshot().unwrap();
        store
            .replace_aggregates(vec![make_aggregate("NEW_B"), make_aggregate("NEW_A")])
            .unwrap();

        assert_eq!(held.len(), 1);
        assert_eq!(held[0].suburb, "OLD");

        let current = store.load_aggregates().unwrap();
        let suburbs: Vec<&str> = current.iter().map(|a| a.suburb.as_str()).collect();
        assert_eq!(suburbs, vec!["NEW_A", "NEW_B"]);
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let store = InMemorySaleStore::new();
        store.insert_sales(&[Sale::new("x", "RYDE", "2112", 1, 1.0, "20250101")]).unwrap();
        store.insert_sales(&[Sale::new("x", "RYDE", "2112", 2, 1.0, "20250101")]).unwrap();

        assert_eq!(store.sales_count().unwrap(), 1);
        assert_eq!(store.scan_sales(&SaleFilter::default()).unwrap()[0].price, 2);
    }
}
