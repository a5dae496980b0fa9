use chrono::{Datelike, Utc};
use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PROCESSING" => Some(OrderStatus::Processing),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub total_cents: i64,
    pub delivery_option: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        let payment_status: String = row.get(6)?;
        let order_status: String = row.get(7)?;
        Ok(Self {
            id: row.get(0)?,
            order_number: row.get(1)?,
            user_id: row.get(2)?,
            total_cents: row.get(3)?,
            delivery_option: row.get(4)?,
            payment_method: row.get(5)?,
            payment_status: PaymentStatus::from_str(&payment_status).unwrap_or(PaymentStatus::Pending),
            order_status: OrderStatus::from_str(&order_status).unwrap_or(OrderStatus::Pending),
            location: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    pub fn total(&self) -> f64 {
        self.total_cents as f64 / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl OrderItem {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        Ok(Self {
            id: row.get(0)?,
            order_id: row.get(1)?,
            product_id: row.get(2)?,
            quantity: row.get(3)?,
            price_cents: row.get(4)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub user_id: String,
    pub total_cents: i64,
    pub delivery_option: String,
    pub payment_method: String,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub location: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrder {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub location: Option<String>,
}

/// `ORD-<year>-<4 random digits>`, as printed on receipts.
pub fn generate_order_number() -> String {
    let digits = Uuid::new_v4().as_u128() % 10_000;
    format!("ORD-{}-{:04}", Utc::now().year(), digits)
}

const ORDER_NUMBER_ATTEMPTS: usize = 5;

const ORDER_COLUMNS: &str = "id, order_number, user_id, total_cents, delivery_option, payment_method, payment_status, order_status, location, created_at, updated_at";

impl Order {
    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS), [id])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(conn: &Connection) -> AppResult<Vec<Self>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM orders ORDER BY created_at DESC, rowid DESC",
                    ORDER_COLUMNS
                ),
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut orders = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            orders.push(Self::from_row(&row).map_err(AppError::from)?);
        }
        Ok(orders)
    }

    pub async fn create(conn: &Connection, data: CreateOrder) -> AppResult<Self> {
        if data.items.is_empty() {
            return Err(AppError::BadRequest("Order must contain at least one item".to_string()));
        }
        if data.items.iter().any(|item| item.quantity <= 0 || item.price_cents < 0) {
            return Err(AppError::BadRequest("Item quantities must be positive".to_string()));
        }
        if data.total_cents < 0 {
            return Err(AppError::BadRequest("Order total cannot be negative".to_string()));
        }

        if User::find_by_id(conn, &data.user_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("Unknown user: {}", data.user_id)));
        }

        let id = Uuid::new_v4().to_string();
        let order_number = Self::unused_order_number(conn).await?;
        conn.execute(
            r#"
            INSERT INTO orders (id, order_number, user_id, total_cents, delivery_option, payment_method, payment_status, order_status, location)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            libsql::params![
                id.clone(),
                order_number,
                data.user_id,
                data.total_cents,
                data.delivery_option,
                data.payment_method,
                data.payment_status.unwrap_or(PaymentStatus::Pending).as_str().to_string(),
                data.order_status.unwrap_or(OrderStatus::Pending).as_str().to_string(),
                data.location.unwrap_or_default()
            ],
        )
        .await
        .map_err(AppError::from)?;

        for item in data.items {
            let item_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price_cents) VALUES (?, ?, ?, ?, ?)",
                libsql::params![item_id, id.clone(), item.product_id, item.quantity, item.price_cents],
            )
            .await
            .map_err(AppError::from)?;
        }

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create order".to_string()))
    }

    async fn unused_order_number(conn: &Connection) -> AppResult<String> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let candidate = generate_order_number();
            let mut rows = conn
                .query("SELECT 1 FROM orders WHERE order_number = ?", [candidate.as_str()])
                .await
                .map_err(AppError::from)?;
            if rows.next().await.map_err(AppError::from)?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal("Could not allocate an order number".to_string()))
    }

    pub async fn update(conn: &Connection, id: &str, data: UpdateOrder) -> AppResult<Self> {
        let current = Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let order_status = data.order_status.unwrap_or(current.order_status);
        let payment_status = data.payment_status.unwrap_or(current.payment_status);
        let location = data.location.unwrap_or(current.location);

        conn.execute(
            r#"
            UPDATE orders SET
                order_status = ?,
                payment_status = ?,
                location = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
            libsql::params![
                order_status.as_str().to_string(),
                payment_status.as_str().to_string(),
                location,
                id.to_string()
            ],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    pub async fn get_items(conn: &Connection, order_id: &str) -> AppResult<Vec<OrderItem>> {
        let mut rows = conn
            .query(
                "SELECT id, order_id, product_id, quantity, price_cents FROM order_items WHERE order_id = ? ORDER BY rowid",
                [order_id],
            )
            .await
            .map_err(AppError::from)?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            items.push(OrderItem::from_row(&row).map_err(AppError::from)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, memory_connection};

    async fn setup() -> (libsql::Database, Connection) {
        let (db, conn) = memory_connection().await;
        fixtures::customer(&conn, "u1", "Amina").await;
        fixtures::product(&conn, "p1", "eggs").await;
        (db, conn)
    }

    fn new_order(items: Vec<CreateOrderItem>) -> CreateOrder {
        CreateOrder {
            user_id: "u1".to_string(),
            total_cents: 90_000,
            delivery_option: "delivery".to_string(),
            payment_method: "mpesa".to_string(),
            payment_status: None,
            order_status: None,
            location: None,
            items,
        }
    }

    fn line(quantity: i64) -> CreateOrderItem {
        CreateOrderItem {
            product_id: "p1".to_string(),
            quantity,
            price_cents: 45_000,
        }
    }

    #[test]
    fn order_number_has_year_and_four_digits() {
        let number = generate_order_number();
        let parts: Vec<_> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], Utc::now().year().to_string());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn statuses_use_upper_case_wire_names() {
        assert_eq!(serde_json::to_value(OrderStatus::Processing).unwrap(), "PROCESSING");
        assert_eq!(serde_json::to_value(PaymentStatus::Paid).unwrap(), "PAID");
        assert_eq!(OrderStatus::from_str("processing"), None);
    }

    #[tokio::test]
    async fn create_stores_items_and_defaults() {
        let (_db, conn) = setup().await;
        let order = Order::create(&conn, new_order(vec![line(2)])).await.unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.location, "");
        assert_eq!(order.total(), 900.0);

        let items = Order::get_items(&conn, &order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn create_rejects_empty_and_non_positive_lines() {
        let (_db, conn) = setup().await;

        let empty = Order::create(&conn, new_order(vec![])).await.unwrap_err();
        assert!(matches!(empty, AppError::BadRequest(_)));

        let zero = Order::create(&conn, new_order(vec![line(0)])).await.unwrap_err();
        assert!(matches!(zero, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_requires_existing_user() {
        let (_db, conn) = setup().await;
        let err = Order::create(
            &conn,
            CreateOrder {
                user_id: "ghost".to_string(),
                ..new_order(vec![line(1)])
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (_db, conn) = setup().await;
        let order = Order::create(
            &conn,
            CreateOrder {
                location: Some("Ruiru".to_string()),
                ..new_order(vec![line(1)])
            },
        )
        .await
        .unwrap();

        let updated = Order::update(
            &conn,
            &order.id,
            UpdateOrder {
                order_status: Some(OrderStatus::Shipped),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.order_status, OrderStatus::Shipped);
        assert_eq!(updated.payment_status, PaymentStatus::Pending);
        assert_eq!(updated.location, "Ruiru");
    }
}
