// 📊 Reporting Aggregator - counts, rankings and trends over a snapshot
//
// compute_report is pure: give it a Snapshot and "today" and it returns the
// same ReportSummary every time. load_report is the boundary that fetches the
// snapshot and falls back to an all-zero summary when the store is down.

use crate::entities::{Customer, CustomerType, Paint, Purchase};
use crate::error::ShopResult;
use crate::gateway::PersistenceGateway;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, error};

// ============================================================================
// INPUT & OPTIONS
// ============================================================================

/// Point-in-time read of customers, paints and purchases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub paints: Vec<Paint>,
    pub purchases: Vec<Purchase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Rows kept in each ranking
    pub top_n: usize,
    /// Months of history in the trend window
    pub trend_months: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            top_n: 10,
            trend_months: 6,
        }
    }
}

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularColor {
    pub paint_id: i64,
    pub color_name: String,
    pub product_type: String,
    pub purchase_count: usize,
    pub total_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCustomer {
    pub customer_id: i64,
    pub name: String,
    pub customer_type: CustomerType,
    pub purchase_count: usize,
    pub last_purchase: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPurchase {
    pub purchase_id: i64,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub color_name: String,
    pub product_type: String,
    pub size: f64,
    pub unit: String,
}

/// Purchases in one calendar month; months without purchases are absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// First day of the month
    pub month: NaiveDate,
    pub purchase_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_customers: usize,
    pub total_paints: usize,
    pub total_purchases: usize,
    pub popular_colors: Vec<PopularColor>,
    pub active_customers: Vec<ActiveCustomer>,
    pub recent_purchases: Vec<RecentPurchase>,
    pub monthly_trend: Vec<MonthlyBucket>,
}

impl ReportSummary {
    pub fn is_empty(&self) -> bool {
        self.total_customers == 0 && self.total_paints == 0 && self.total_purchases == 0
    }

    /// Average purchase volume of the top colors, as shown on the report page
    pub fn average_volume(color: &PopularColor) -> f64 {
        if color.purchase_count == 0 {
            return 0.0;
        }
        color.total_volume / color.purchase_count as f64
    }
}

/// Summary plus the warning shown when the store could not be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ============================================================================
// AGGREGATION
// ============================================================================

pub fn compute_report(snapshot: &Snapshot, today: NaiveDate) -> ReportSummary {
    compute_report_with(snapshot, today, &ReportOptions::default())
}

pub fn compute_report_with(snapshot: &Snapshot, today: NaiveDate, options: &ReportOptions) -> ReportSummary {
    let customers: HashMap<i64, &Customer> = snapshot.customers.iter().map(|c| (c.id, c)).collect();
    let paints: HashMap<i64, &Paint> = snapshot.paints.iter().map(|p| (p.id, p)).collect();

    let summary = ReportSummary {
        total_customers: snapshot.customers.len(),
        total_paints: snapshot.paints.len(),
        total_purchases: snapshot.purchases.len(),
        popular_colors: popular_colors(&snapshot.purchases, &paints, options.top_n),
        active_customers: active_customers(&snapshot.purchases, &customers, options.top_n),
        recent_purchases: recent_purchases(&snapshot.purchases, &customers, &paints, options.top_n),
        monthly_trend: monthly_trend(&snapshot.purchases, today, options.trend_months),
    };

    debug!(
        customers = summary.total_customers,
        paints = summary.total_paints,
        purchases = summary.total_purchases,
        trend_buckets = summary.monthly_trend.len(),
        "report computed"
    );

    summary
}

/// Rank paints by purchase count, then by total volume
fn popular_colors(purchases: &[Purchase], paints: &HashMap<i64, &Paint>, top_n: usize) -> Vec<PopularColor> {
    let mut by_paint: HashMap<i64, (usize, f64)> = HashMap::new();
    for purchase in purchases.iter().filter(|p| paints.contains_key(&p.paint_id)) {
        let entry = by_paint.entry(purchase.paint_id).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += purchase.size;
    }

    let mut ranked: Vec<PopularColor> = by_paint
        .into_iter()
        .filter_map(|(paint_id, (purchase_count, total_volume))| {
            let paint = paints.get(&paint_id)?;
            Some(PopularColor {
                paint_id,
                color_name: paint.color_name.clone(),
                product_type: paint.product_type.clone(),
                purchase_count,
                total_volume,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.purchase_count
            .cmp(&a.purchase_count)
            .then_with(|| b.total_volume.partial_cmp(&a.total_volume).unwrap_or(Ordering::Equal))
            .then_with(|| a.paint_id.cmp(&b.paint_id))
    });
    ranked.truncate(top_n);
    ranked
}

/// Rank customers with at least one purchase by purchase count
fn active_customers(
    purchases: &[Purchase],
    customers: &HashMap<i64, &Customer>,
    top_n: usize,
) -> Vec<ActiveCustomer> {
    let mut by_customer: HashMap<i64, (usize, NaiveDate)> = HashMap::new();
    for purchase in purchases.iter().filter(|p| customers.contains_key(&p.customer_id)) {
        let entry = by_customer
            .entry(purchase.customer_id)
            .or_insert((0, purchase.purchase_date));
        entry.0 += 1;
        entry.1 = entry.1.max(purchase.purchase_date);
    }

    let mut ranked: Vec<ActiveCustomer> = by_customer
        .into_iter()
        .filter_map(|(customer_id, (purchase_count, last_purchase))| {
            let customer = customers.get(&customer_id)?;
            Some(ActiveCustomer {
                customer_id,
                name: customer.name.clone(),
                customer_type: customer.customer_type,
                purchase_count,
                last_purchase,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.purchase_count
            .cmp(&a.purchase_count)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(top_n);
    ranked
}

/// Newest purchases joined with customer and paint names
fn recent_purchases(
    purchases: &[Purchase],
    customers: &HashMap<i64, &Customer>,
    paints: &HashMap<i64, &Paint>,
    top_n: usize,
) -> Vec<RecentPurchase> {
    let mut joined: Vec<RecentPurchase> = purchases
        .iter()
        .filter_map(|purchase| {
            let customer = customers.get(&purchase.customer_id)?;
            let paint = paints.get(&purchase.paint_id)?;
            Some(RecentPurchase {
                purchase_id: purchase.id,
                purchase_date: purchase.purchase_date,
                created_at: purchase.created_at,
                customer_name: customer.name.clone(),
                color_name: paint.color_name.clone(),
                product_type: paint.product_type.clone(),
                size: purchase.size,
                unit: purchase.unit.clone(),
            })
        })
        .collect();

    joined.sort_by(|a, b| {
        b.purchase_date
            .cmp(&a.purchase_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.purchase_id.cmp(&a.purchase_id))
    });
    joined.truncate(top_n);
    joined
}

/// Oldest date still inside the trend window (inclusive)
pub fn trend_cutoff(today: NaiveDate, months: u32) -> NaiveDate {
    // chrono clamps to the last day of the month (Aug 31 - 6 months = Feb 28/29)
    today.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Purchase counts per calendar month inside the window, newest month first
fn monthly_trend(purchases: &[Purchase], today: NaiveDate, months: u32) -> Vec<MonthlyBucket> {
    let cutoff = trend_cutoff(today, months);

    let mut by_month: HashMap<NaiveDate, usize> = HashMap::new();
    for purchase in purchases.iter().filter(|p| p.purchase_date >= cutoff) {
        *by_month.entry(month_start(purchase.purchase_date)).or_insert(0) += 1;
    }

    let mut buckets: Vec<MonthlyBucket> = by_month
        .into_iter()
        .map(|(month, purchase_count)| MonthlyBucket { month, purchase_count })
        .collect();
    buckets.sort_by(|a, b| b.month.cmp(&a.month));
    buckets
}

// ============================================================================
// BOUNDARY
// ============================================================================

/// Fetch a snapshot and aggregate it; store failures propagate
pub fn fetch_report(
    gateway: &dyn PersistenceGateway,
    today: NaiveDate,
    options: &ReportOptions,
) -> ShopResult<ReportSummary> {
    let snapshot = gateway.snapshot()?;
    Ok(compute_report_with(&snapshot, today, options))
}

/// Like fetch_report, but a failing store yields zeros plus a warning
pub fn load_report(gateway: &dyn PersistenceGateway, today: NaiveDate, options: &ReportOptions) -> ReportOutcome {
    match fetch_report(gateway, today, options) {
        Ok(summary) => ReportOutcome { summary, warning: None },
        Err(e) => {
            error!(error = %e, "report data unavailable, showing placeholder zeros");
            ReportOutcome {
                summary: ReportSummary::default(),
                warning: Some(format!("Report data could not be loaded: {}", e)),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use crate::gateway::testing::OfflineGateway;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            customer_type: CustomerType::Individual,
            phone: None,
            email: None,
            notes: None,
            created_at: stamp(0),
            updated_at: stamp(0),
        }
    }

    fn paint(id: i64, color: &str) -> Paint {
        Paint {
            id,
            color_name: color.to_string(),
            product_type: "QD Enamel".to_string(),
            base_size: 1.0,
            base_unit: "litre".to_string(),
            description: None,
            created_at: stamp(0),
            updated_at: stamp(0),
        }
    }

    fn purchase(id: i64, customer_id: i64, paint_id: i64, size: f64, day: NaiveDate) -> Purchase {
        Purchase {
            id,
            customer_id,
            paint_id,
            size,
            unit: "litre".to_string(),
            purchase_date: day,
            notes: None,
            created_at: stamp(id),
        }
    }

    #[test]
    fn test_totals() {
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana"), customer(2, "Bo")],
            paints: vec![paint(1, "Ocean Blue")],
            purchases: vec![purchase(1, 1, 1, 4.0, date(2025, 5, 1))],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));

        assert_eq!(report.total_customers, 2);
        assert_eq!(report.total_paints, 1);
        assert_eq!(report.total_purchases, 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_popular_colors_tie_broken_by_volume() {
        let day = date(2025, 5, 1);
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana")],
            paints: vec![paint(1, "Sage"), paint(2, "Coral")],
            purchases: vec![
                // Sage: 3 purchases, 10.0 total
                purchase(1, 1, 1, 4.0, day),
                purchase(2, 1, 1, 4.0, day),
                purchase(3, 1, 1, 2.0, day),
                // Coral: 3 purchases, 15.5 total
                purchase(4, 1, 2, 5.0, day),
                purchase(5, 1, 2, 5.5, day),
                purchase(6, 1, 2, 5.0, day),
            ],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));

        assert_eq!(report.popular_colors.len(), 2);
        assert_eq!(report.popular_colors[0].color_name, "Coral");
        assert_eq!(report.popular_colors[0].total_volume, 15.5);
        assert_eq!(report.popular_colors[1].color_name, "Sage");
        assert_eq!(report.popular_colors[1].total_volume, 10.0);
    }

    #[test]
    fn test_popular_colors_count_beats_volume() {
        let day = date(2025, 5, 1);
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana")],
            paints: vec![paint(1, "Sage"), paint(2, "Coral")],
            purchases: vec![
                purchase(1, 1, 1, 1.0, day),
                purchase(2, 1, 1, 1.0, day),
                purchase(3, 1, 2, 50.0, day),
            ],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));
        assert_eq!(report.popular_colors[0].color_name, "Sage");
        assert_eq!(report.popular_colors[0].purchase_count, 2);
    }

    #[test]
    fn test_rankings_keep_top_ten() {
        let day = date(2025, 5, 1);
        let paints: Vec<Paint> = (1..=12).map(|id| paint(id, &format!("Color {}", id))).collect();
        let customers: Vec<Customer> = (1..=12).map(|id| customer(id, &format!("Customer {}", id))).collect();
        let purchases: Vec<Purchase> = (1..=12).map(|id| purchase(id, id, id, id as f64, day)).collect();

        let report = compute_report(&Snapshot { customers, paints, purchases }, date(2025, 6, 1));

        assert_eq!(report.popular_colors.len(), 10);
        assert_eq!(report.active_customers.len(), 10);
        assert_eq!(report.recent_purchases.len(), 10);
        // equal counts: larger volume first
        assert_eq!(report.popular_colors[0].paint_id, 12);
    }

    #[test]
    fn test_active_customers_count_and_last_purchase() {
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana"), customer(2, "Bo"), customer(3, "Cy")],
            paints: vec![paint(1, "Sage")],
            purchases: vec![
                purchase(1, 2, 1, 1.0, date(2025, 1, 10)),
                purchase(2, 2, 1, 1.0, date(2025, 4, 2)),
                purchase(3, 2, 1, 1.0, date(2025, 2, 20)),
                purchase(4, 1, 1, 1.0, date(2025, 5, 1)),
            ],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));

        assert_eq!(report.active_customers.len(), 2);
        assert_eq!(report.active_customers[0].name, "Bo");
        assert_eq!(report.active_customers[0].purchase_count, 3);
        assert_eq!(report.active_customers[0].last_purchase, date(2025, 4, 2));
        assert_eq!(report.active_customers[1].name, "Ana");
    }

    #[test]
    fn test_recent_purchases_order_by_date_then_created_at() {
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana")],
            paints: vec![paint(1, "Sage")],
            purchases: vec![
                purchase(1, 1, 1, 1.0, date(2025, 5, 1)),
                purchase(2, 1, 1, 2.0, date(2025, 5, 3)),
                // same date as #2 but entered later
                purchase(3, 1, 1, 3.0, date(2025, 5, 3)),
            ],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));
        let ids: Vec<i64> = report.recent_purchases.iter().map(|p| p.purchase_id).collect();

        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(report.recent_purchases[0].customer_name, "Ana");
        assert_eq!(report.recent_purchases[0].color_name, "Sage");
    }

    #[test]
    fn test_monthly_trend_window_includes_boundary() {
        let today = date(2025, 6, 15);
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana")],
            paints: vec![paint(1, "Sage")],
            purchases: vec![
                purchase(1, 1, 1, 1.0, date(2024, 12, 15)), // exactly 6 months ago
                purchase(2, 1, 1, 1.0, date(2024, 12, 14)), // one day too old
                purchase(3, 1, 1, 1.0, date(2025, 3, 2)),
                purchase(4, 1, 1, 1.0, date(2025, 3, 28)),
                purchase(5, 1, 1, 1.0, date(2025, 6, 1)),
            ],
        };

        let report = compute_report(&snapshot, today);

        assert_eq!(
            report.monthly_trend,
            vec![
                MonthlyBucket { month: date(2025, 6, 1), purchase_count: 1 },
                MonthlyBucket { month: date(2025, 3, 1), purchase_count: 2 },
                MonthlyBucket { month: date(2024, 12, 1), purchase_count: 1 },
            ]
        );
    }

    #[test]
    fn test_trend_cutoff_clamps_to_month_end() {
        assert_eq!(trend_cutoff(date(2025, 8, 31), 6), date(2025, 2, 28));
        assert_eq!(trend_cutoff(date(2024, 8, 31), 6), date(2024, 2, 29));
    }

    #[test]
    fn test_purchases_with_missing_join_rows_are_skipped() {
        let snapshot = Snapshot {
            customers: vec![customer(1, "Ana")],
            paints: vec![paint(1, "Sage")],
            purchases: vec![
                purchase(1, 1, 1, 1.0, date(2025, 5, 1)),
                purchase(2, 9, 1, 1.0, date(2025, 5, 2)),
                purchase(3, 1, 9, 1.0, date(2025, 5, 3)),
            ],
        };

        let report = compute_report(&snapshot, date(2025, 6, 1));

        assert_eq!(report.total_purchases, 3);
        assert_eq!(report.recent_purchases.len(), 1);
        assert_eq!(report.popular_colors[0].purchase_count, 2);
        assert_eq!(report.active_customers[0].purchase_count, 2);
        // trend counts purchases without joining
        assert_eq!(report.monthly_trend[0].purchase_count, 3);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_report() {
        let report = compute_report(&Snapshot::default(), date(2025, 6, 1));
        assert_eq!(report, ReportSummary::default());
    }

    #[test]
    fn test_average_volume() {
        let color = PopularColor {
            paint_id: 1,
            color_name: "Sage".to_string(),
            product_type: "DTM".to_string(),
            purchase_count: 4,
            total_volume: 10.0,
        };
        assert_eq!(ReportSummary::average_volume(&color), 2.5);
    }

    #[test]
    fn test_fetch_report_signals_data_source_unavailable() {
        let result = fetch_report(&OfflineGateway, date(2025, 6, 1), &ReportOptions::default());
        assert!(matches!(result, Err(ShopError::DataSourceUnavailable(_))));
    }

    #[test]
    fn test_load_report_falls_back_to_zeros_with_warning() {
        let outcome = load_report(&OfflineGateway, date(2025, 6, 1), &ReportOptions::default());

        assert_eq!(outcome.summary, ReportSummary::default());
        assert!(outcome.summary.is_empty());
        assert!(outcome.warning.unwrap().contains("connection refused"));
    }
}
