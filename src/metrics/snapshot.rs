use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::series::{cents_to_units, merge_daily, percent_change, DailyPoint, MonthlyPoint};
use super::source::{MetricsSource, RecentSale};
use super::window::Windows;
use super::MetricsError;
use crate::models::OrderStatus;

const RECENT_SALES_LIMIT: u32 = 5;

/// A metric's value in the current and previous window. Serializes as the
/// whole-number percentage only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentDelta {
    pub current: f64,
    pub previous: f64,
    pub percent: i64,
}

impl PercentDelta {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            percent: percent_change(current, previous),
        }
    }
}

impl Serialize for PercentDelta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentChanges {
    pub orders: PercentDelta,
    pub members: PercentDelta,
    pub sales: PercentDelta,
    pub processing: PercentDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_products: i64,
    pub total_members: i64,
    pub total_sales: f64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    pub total_tally_entries: i64,
    pub total_orders: i64,
    pub percent_changes: PercentChanges,
    pub recent_sales: Vec<RecentSale>,
    pub monthly_data: Vec<MonthlyPoint>,
    pub daily_data: Vec<DailyPoint>,
}

/// Computes the dashboard at `now`. Queries run one after another and the
/// first failure aborts the whole snapshot.
pub async fn build_snapshot(
    source: &dyn MetricsSource,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot, MetricsError> {
    let windows = Windows::at(now);

    let total_products = source.count_products().await?;
    let total_orders = source.count_orders(None, None).await?;
    let total_members = source.count_members(None).await?;
    let total_sales_cents = source.paid_sales_cents(None).await?;
    let pending_orders = source.count_orders(Some(OrderStatus::Pending), None).await?;
    let processing_orders = source.count_orders(Some(OrderStatus::Processing), None).await?;
    let total_tally_entries = source.count_tally_entries().await?;

    let orders = PercentDelta::new(
        source.count_orders(None, Some(windows.month)).await? as f64,
        source.count_orders(None, Some(windows.previous_month)).await? as f64,
    );
    let members = PercentDelta::new(
        source.count_members(Some(windows.month)).await? as f64,
        source.count_members(Some(windows.previous_month)).await? as f64,
    );
    let sales = PercentDelta::new(
        cents_to_units(source.paid_sales_cents(Some(windows.month)).await?),
        cents_to_units(source.paid_sales_cents(Some(windows.previous_month)).await?),
    );
    let processing = PercentDelta::new(
        source
            .count_orders(Some(OrderStatus::Processing), Some(windows.week))
            .await? as f64,
        source
            .count_orders(Some(OrderStatus::Processing), Some(windows.previous_week))
            .await? as f64,
    );

    let recent_sales = source.recent_paid_orders(RECENT_SALES_LIMIT).await?;

    let daily_sales = source.daily_sales(windows.daily_since).await?;
    let daily_tally = source.daily_tally(windows.daily_since).await?;
    let daily_items = source.daily_processing_items(windows.daily_since).await?;
    let daily_data = merge_daily(&daily_sales, &daily_tally, &daily_items);

    let monthly_data = source
        .monthly_quantities(windows.monthly_since)
        .await?
        .into_iter()
        .map(MonthlyPoint::from)
        .collect::<Vec<_>>();

    tracing::debug!(
        days = daily_data.len(),
        months = monthly_data.len(),
        recent = recent_sales.len(),
        "Built dashboard snapshot"
    );

    Ok(DashboardSnapshot {
        total_products,
        total_members,
        total_sales: cents_to_units(total_sales_cents),
        pending_orders,
        processing_orders,
        total_tally_entries,
        total_orders,
        percent_changes: PercentChanges {
            orders,
            members,
            sales,
            processing,
        },
        recent_sales,
        monthly_data,
        daily_data,
    })
}
