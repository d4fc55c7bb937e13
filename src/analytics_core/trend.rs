//! Suburb drill-down helpers: monthly price trend and recent sales

use super::sale::Sale;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of sales returned with a suburb detail
pub const RECENT_SALES_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPriceTrend {
    /// YYYYMM
    pub month: String,
    pub sales_count: usize,
    pub avg_price: f64,
    pub min_price: i64,
    pub max_price: i64,
}

/// Price summary per settlement month, oldest first
pub fn monthly_price_trend(sales: &[Sale]) -> Vec<MonthlyPriceTrend> {
    let mut months: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for sale in sales {
        months.entry(sale.settlement_month()).or_default().push(sale.price);
    }

    months
        .into_iter()
        .filter_map(|(month, prices)| {
            Some(MonthlyPriceTrend {
                month: month.to_string(),
                sales_count: prices.len(),
                avg_price: prices.iter().sum::<i64>() as f64 / prices.len() as f64,
                min_price: *prices.iter().min()?,
                max_price: *prices.iter().max()?,
            })
        })
        .collect()
}

/// Latest `limit` sales, newest settlement first
pub fn recent_sales(sales: &[Sale], limit: usize) -> Vec<Sale> {
    let mut sorted: Vec<Sale> = sales.to_vec();
    sorted.sort_by(|a, b| b.settlement_date.cmp(&a.settlement_date));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_trend() {
        let sales = vec![
            Sale::new("a", "RYDE", "2112", 100, 0.0, "20250210"),
            Sale::new("b", "RYDE", "2112", 300, 0.0, "20250102"),
            Sale::new("c", "RYDE", "2112", 200, 0.0, "20250215"),
        ];

        let trend = monthly_price_trend(&sales);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].month, "202501");
        assert_eq!(trend[0].sales_count, 1);
        assert_eq!(trend[1].month, "202502");
        assert_eq!(trend[1].avg_price, 150.0);
        assert_eq!(trend[1].min_price, 100);
        assert_eq!(trend[1].max_price, 200);
    }

    #[test]
    fn test_recent_sales_newest_first() {
        let sales: Vec<Sale> = (1..=9)
            .map(|d| Sale::new(format!("s{}", d), "RYDE", "2112", 100, 0.0, format!("2025010{}", d)))
            .collect();

        let recent = recent_sales(&sales, 3);
        let dates: Vec<&str> = recent.iter().map(|s| s.settlement_date.as_str()).collect();
        assert_eq!(dates, vec!["20250109", "20250108", "20250107"]);
    }
}
