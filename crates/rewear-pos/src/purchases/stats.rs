use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::Purchase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub count: usize,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayStats {
    pub date: NaiveDate,
    pub total_purchases: usize,
    pub total_amount: i64,
    pub total_items: usize,
}

/// Per-day totals for the trailing `days` window, newest day first.
pub fn daily(purchases: &[Purchase], now: DateTime<Utc>, days: i64) -> Vec<DailyStats> {
    let since = now - Duration::days(days.max(0));
    let mut buckets: BTreeMap<NaiveDate, (usize, i64)> = BTreeMap::new();
    for purchase in purchases.iter().filter(|p| p.timestamp >= since) {
        let entry = buckets.entry(purchase.timestamp.date_naive()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(purchase.total);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(date, (count, total))| DailyStats { date, count, total })
        .collect()
}

/// Per-month totals over all purchases, newest month first, capped at `months`.
pub fn monthly(purchases: &[Purchase], months: usize) -> Vec<MonthlyStats> {
    let mut buckets: BTreeMap<(i32, u32), (usize, i64)> = BTreeMap::new();
    for purchase in purchases {
        let key = (purchase.timestamp.year(), purchase.timestamp.month());
        let entry = buckets.entry(key).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(purchase.total);
    }

    buckets
        .into_iter()
        .rev()
        .take(months)
        .map(|((year, month), (count, total))| MonthlyStats {
            month: format!("{year:04}-{month:02}"),
            count,
            total,
        })
        .collect()
}

pub fn today(purchases: &[Purchase], now: DateTime<Utc>) -> TodayStats {
    let date = now.date_naive();
    let todays = purchases
        .iter()
        .filter(|purchase| purchase.timestamp.date_naive() == date);

    let mut stats = TodayStats {
        date,
        total_purchases: 0,
        total_amount: 0,
        total_items: 0,
    };
    for purchase in todays {
        stats.total_purchases += 1;
        stats.total_amount = stats.total_amount.saturating_add(purchase.total);
        stats.total_items += purchase.items.len();
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchases::domain::{PurchaseId, PurchaseItem};
    use chrono::TimeZone;

    fn purchase(id: &str, at: DateTime<Utc>, prices: &[i64]) -> Purchase {
        Purchase {
            id: PurchaseId(id.to_string()),
            items: prices
                .iter()
                .enumerate()
                .map(|(idx, price)| PurchaseItem {
                    id: format!("{id}-{idx}"),
                    category: "Jeans".to_string(),
                    price_level: "Mittel".to_string(),
                    condition: "Neu".to_string(),
                    relevance: "Wichtig".to_string(),
                    price: *price,
                })
                .collect(),
            total: prices.iter().sum(),
            credit_customer_id: None,
            staff_username: None,
            timestamp: at,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid timestamp")
    }

    fn history() -> Vec<Purchase> {
        vec![
            purchase("p1", at(2025, 9, 30, 10), &[500, 700]),
            purchase("p2", at(2025, 10, 1, 9), &[1200]),
            purchase("p3", at(2025, 10, 1, 15), &[300, 300, 400]),
            purchase("p4", at(2025, 10, 2, 11), &[2500]),
        ]
    }

    #[test]
    fn daily_groups_recent_days_newest_first() {
        let stats = daily(&history(), at(2025, 10, 2, 18), 2);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].date, NaiveDate::from_ymd_opt(2025, 10, 2).expect("date"));
        assert_eq!(stats[0].total, 2500);
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].total, 2200);
    }

    #[test]
    fn monthly_caps_number_of_months() {
        let stats = monthly(&history(), 1);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].month, "2025-10");
        assert_eq!(stats[0].count, 3);

        let stats = monthly(&history(), 12);
        assert_eq!(stats[1].month, "2025-09");
        assert_eq!(stats[1].total, 1200);
    }

    #[test]
    fn today_counts_items_and_amount() {
        let stats = today(&history(), at(2025, 10, 1, 20));
        assert_eq!(stats.total_purchases, 2);
        assert_eq!(stats.total_amount, 2200);
        assert_eq!(stats.total_items, 4);
    }
}
