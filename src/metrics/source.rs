use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::series::{DailyQuantity, DailySales, MonthlyQuantities};
use super::window::Window;
use super::MetricsError;
use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A paid order as listed on the dashboard, buyer attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSale {
    #[serde(flatten)]
    pub order: Order,
    pub total: f64,
    pub user: Buyer,
}

/// Read-only queries the dashboard aggregator runs against the store.
///
/// Every `window` argument filters on the record's creation time; `None` means
/// all time.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn count_products(&self) -> Result<i64, MetricsError>;

    async fn count_orders(
        &self,
        status: Option<OrderStatus>,
        window: Option<Window>,
    ) -> Result<i64, MetricsError>;

    /// Customers only; admins are not members.
    async fn count_members(&self, window: Option<Window>) -> Result<i64, MetricsError>;

    /// Sum of order totals with payment status PAID, zero when none match.
    async fn paid_sales_cents(&self, window: Option<Window>) -> Result<i64, MetricsError>;

    async fn count_tally_entries(&self) -> Result<i64, MetricsError>;

    /// Newest paid orders first.
    async fn recent_paid_orders(&self, limit: u32) -> Result<Vec<RecentSale>, MetricsError>;

    /// Paid orders grouped by their creation day.
    async fn daily_sales(&self, since: DateTime<Utc>) -> Result<Vec<DailySales>, MetricsError>;

    /// Tally line quantities grouped by their entry's creation day.
    async fn daily_tally(&self, since: DateTime<Utc>) -> Result<Vec<DailyQuantity>, MetricsError>;

    /// Line quantities of PROCESSING orders grouped by the order's creation day.
    async fn daily_processing_items(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyQuantity>, MetricsError>;

    /// All order lines grouped by the order's creation month, split by product category.
    async fn monthly_quantities(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyQuantities>, MetricsError>;
}

pub(crate) fn parse_day(value: &str) -> Result<NaiveDate, MetricsError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| MetricsError::Query(format!("invalid day key {:?}: {}", value, e)))
}

pub(crate) fn parse_month(value: &str) -> Result<NaiveDate, MetricsError> {
    parse_day(&format!("{}-01", value))
}
