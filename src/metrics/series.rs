use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

/// Paid-order revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySales {
    pub day: NaiveDate,
    pub total_cents: i64,
    pub order_count: i64,
}

/// A summed quantity for one calendar day (tally lines or order lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyQuantity {
    pub day: NaiveDate,
    pub quantity: i64,
}

/// Order-line quantities per product category for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyQuantities {
    /// First day of the month.
    pub month: NaiveDate,
    pub eggs: i64,
    pub meat: i64,
    pub prepared: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub date: String,
    pub total_sales: f64,
    pub order_count: i64,
    pub tally_quantity: i64,
    pub order_item_quantity: i64,
    pub average_sale_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: String,
    pub label: String,
    pub eggs: i64,
    pub meat: i64,
    pub prepared: i64,
}

impl From<MonthlyQuantities> for MonthlyPoint {
    fn from(row: MonthlyQuantities) -> Self {
        Self {
            month: row.month.format("%Y-%m").to_string(),
            label: row.month.format("%b %Y").to_string(),
            eggs: row.eggs,
            meat: row.meat,
            prepared: row.prepared,
        }
    }
}

/// Whole-number percentage change from `previous` to `current`.
///
/// An empty or non-positive previous window reports no change rather than an
/// undefined or infinite value. Halves round away from zero.
pub fn percent_change(current: f64, previous: f64) -> i64 {
    if previous <= 0.0 {
        return 0;
    }
    ((current - previous) / previous * 100.0).round() as i64
}

/// Joins the three day-grouped sources into one table, oldest day first.
///
/// Only days present in at least one source appear. Fields a source has no row
/// for default to zero. The average sale value is that day's revenue divided by
/// that day's processing order-line quantity, or zero when there were none.
pub fn merge_daily(
    sales: &[DailySales],
    tally: &[DailyQuantity],
    order_items: &[DailyQuantity],
) -> Vec<DailyPoint> {
    let sales_by_day: BTreeMap<NaiveDate, &DailySales> = sales.iter().map(|s| (s.day, s)).collect();
    let tally_by_day: BTreeMap<NaiveDate, i64> = tally.iter().map(|t| (t.day, t.quantity)).collect();
    let items_by_day: BTreeMap<NaiveDate, i64> =
        order_items.iter().map(|i| (i.day, i.quantity)).collect();

    let days: BTreeSet<NaiveDate> = sales_by_day
        .keys()
        .chain(tally_by_day.keys())
        .chain(items_by_day.keys())
        .copied()
        .collect();

    days.into_iter()
        .map(|day| {
            let (total_cents, order_count) = sales_by_day
                .get(&day)
                .map_or((0, 0), |s| (s.total_cents, s.order_count));
            let order_item_quantity = items_by_day.get(&day).copied().unwrap_or(0);
            let total_sales = cents_to_units(total_cents);

            DailyPoint {
                day,
                date: day.format("%b %-d").to_string(),
                total_sales,
                order_count,
                tally_quantity: tally_by_day.get(&day).copied().unwrap_or(0),
                order_item_quantity,
                average_sale_value: if order_item_quantity > 0 {
                    total_sales / order_item_quantity as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}

pub(crate) fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}
