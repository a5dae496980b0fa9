use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::Connection;

use super::series::{cents_to_units, DailyQuantity, DailySales, MonthlyQuantities};
use super::source::{parse_day, parse_month, Buyer, MetricsSource, RecentSale};
use super::window::Window;
use super::MetricsError;
use crate::db::to_sql_timestamp;
use crate::models::{Order, OrderStatus, PaymentStatus, ProductCategory, UserRole};

/// `MetricsSource` over the application's libsql database.
pub struct LibsqlMetricsSource {
    conn: Connection,
}

impl LibsqlMetricsSource {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    async fn scalar(&self, sql: &str, params: Vec<libsql::Value>) -> Result<i64, MetricsError> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }

    async fn daily_quantities(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<DailyQuantity>, MetricsError> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let day: String = row.get(0)?;
            out.push(DailyQuantity {
                day: parse_day(&day)?,
                quantity: row.get(1)?,
            });
        }
        Ok(out)
    }
}

/// Appends `created_at` bounds for `window` to `clauses`/`params`.
fn push_window(column: &str, window: Option<Window>, clauses: &mut Vec<String>, params: &mut Vec<libsql::Value>) {
    let Some(window) = window else {
        return;
    };
    params.push(to_sql_timestamp(window.start).into());
    clauses.push(format!("{} >= ?{}", column, params.len()));
    if let Some(end) = window.end {
        params.push(to_sql_timestamp(end).into());
        clauses.push(format!("{} < ?{}", column, params.len()));
    }
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

#[async_trait]
impl MetricsSource for LibsqlMetricsSource {
    async fn count_products(&self) -> Result<i64, MetricsError> {
        self.scalar("SELECT COUNT(*) FROM products", Vec::new()).await
    }

    async fn count_orders(
        &self,
        status: Option<OrderStatus>,
        window: Option<Window>,
    ) -> Result<i64, MetricsError> {
        let mut clauses = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(status) = status {
            params.push(status.as_str().to_string().into());
            clauses.push(format!("order_status = ?{}", params.len()));
        }
        push_window("created_at", window, &mut clauses, &mut params);

        let sql = format!("SELECT COUNT(*) FROM orders{}", where_sql(&clauses));
        self.scalar(&sql, params).await
    }

    async fn count_members(&self, window: Option<Window>) -> Result<i64, MetricsError> {
        let mut clauses = vec!["role = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![UserRole::Customer.as_str().to_string().into()];
        push_window("created_at", window, &mut clauses, &mut params);

        let sql = format!("SELECT COUNT(*) FROM users{}", where_sql(&clauses));
        self.scalar(&sql, params).await
    }

    async fn paid_sales_cents(&self, window: Option<Window>) -> Result<i64, MetricsError> {
        let mut clauses = vec!["payment_status = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![PaymentStatus::Paid.as_str().to_string().into()];
        push_window("created_at", window, &mut clauses, &mut params);

        let sql = format!(
            "SELECT COALESCE(SUM(total_cents), 0) FROM orders{}",
            where_sql(&clauses)
        );
        self.scalar(&sql, params).await
    }

    async fn count_tally_entries(&self) -> Result<i64, MetricsError> {
        self.scalar("SELECT COUNT(*) FROM tally_entries", Vec::new()).await
    }

    async fn recent_paid_orders(&self, limit: u32) -> Result<Vec<RecentSale>, MetricsError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT o.id, o.order_number, o.user_id, o.total_cents, o.delivery_option,
                       o.payment_method, o.payment_status, o.order_status, o.location,
                       o.created_at, o.updated_at, u.id, u.name, u.email
                FROM orders o
                JOIN users u ON u.id = o.user_id
                WHERE o.payment_status = ?1
                ORDER BY o.created_at DESC, o.rowid DESC
                LIMIT ?2
                "#,
                libsql::params![PaymentStatus::Paid.as_str().to_string(), limit as i64],
            )
            .await?;

        let mut sales = Vec::new();
        while let Some(row) = rows.next().await? {
            let order = Order::from_row(&row)?;
            sales.push(RecentSale {
                total: cents_to_units(order.total_cents),
                order,
                user: Buyer {
                    id: row.get(11)?,
                    name: row.get(12)?,
                    email: row.get(13)?,
                },
            });
        }
        Ok(sales)
    }

    async fn daily_sales(&self, since: DateTime<Utc>) -> Result<Vec<DailySales>, MetricsError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT date(created_at) AS day, COALESCE(SUM(total_cents), 0), COUNT(id)
                FROM orders
                WHERE created_at >= ?1 AND payment_status = ?2
                GROUP BY day
                ORDER BY day
                "#,
                libsql::params![to_sql_timestamp(since), PaymentStatus::Paid.as_str().to_string()],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let day: String = row.get(0)?;
            out.push(DailySales {
                day: parse_day(&day)?,
                total_cents: row.get(1)?,
                order_count: row.get(2)?,
            });
        }
        Ok(out)
    }

    async fn daily_tally(&self, since: DateTime<Utc>) -> Result<Vec<DailyQuantity>, MetricsError> {
        self.daily_quantities(
            r#"
            SELECT date(te.created_at) AS day, COALESCE(SUM(ti.quantity), 0)
            FROM tally_entries te
            JOIN tally_items ti ON ti.entry_id = te.id
            WHERE te.created_at >= ?1
            GROUP BY day
            ORDER BY day
            "#,
            vec![to_sql_timestamp(since).into()],
        )
        .await
    }

    async fn daily_processing_items(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyQuantity>, MetricsError> {
        self.daily_quantities(
            r#"
            SELECT date(o.created_at) AS day, COALESCE(SUM(oi.quantity), 0)
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.created_at >= ?1 AND o.order_status = ?2
            GROUP BY day
            ORDER BY day
            "#,
            vec![
                to_sql_timestamp(since).into(),
                OrderStatus::Processing.as_str().to_string().into(),
            ],
        )
        .await
    }

    async fn monthly_quantities(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyQuantities>, MetricsError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT strftime('%Y-%m', o.created_at) AS month,
                       COALESCE(SUM(CASE WHEN p.category = ?2 THEN oi.quantity ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN p.category = ?3 THEN oi.quantity ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN p.category = ?4 THEN oi.quantity ELSE 0 END), 0)
                FROM order_items oi
                JOIN products p ON p.id = oi.product_id
                JOIN orders o ON o.id = oi.order_id
                WHERE o.created_at >= ?1
                GROUP BY month
                ORDER BY month
                "#,
                libsql::params![
                    to_sql_timestamp(since),
                    ProductCategory::Eggs.as_str().to_string(),
                    ProductCategory::Meat.as_str().to_string(),
                    ProductCategory::Prepared.as_str().to_string()
                ],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let month: String = row.get(0)?;
            out.push(MonthlyQuantities {
                month: parse_month(&month)?,
                eggs: row.get(1)?,
                meat: row.get(2)?,
                prepared: row.get(3)?,
            });
        }
        Ok(out)
    }
}
