use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Eggs,
    Meat,
    Feed,
    Prepared,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Eggs => "eggs",
            ProductCategory::Meat => "meat",
            ProductCategory::Feed => "feed",
            ProductCategory::Prepared => "prepared",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "eggs" => Some(ProductCategory::Eggs),
            "meat" => Some(ProductCategory::Meat),
            "feed" => Some(ProductCategory::Feed),
            "prepared" => Some(ProductCategory::Prepared),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub image: String,
    pub category: ProductCategory,
    pub featured: bool,
    pub in_stock: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        let category: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price_cents: row.get(3)?,
            image: row.get(4)?,
            category: ProductCategory::from_str(&category).unwrap_or(ProductCategory::Prepared),
            featured: row.get::<i32>(6)? != 0,
            in_stock: row.get::<i32>(7)? != 0,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    pub fn price(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image: Option<String>,
    pub category: ProductCategory,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
    pub category: Option<ProductCategory>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, image, category, featured, in_stock, created_at, updated_at";

impl Product {
    pub async fn list_all(conn: &Connection) -> AppResult<Vec<Self>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM products ORDER BY created_at DESC, rowid DESC",
                    PRODUCT_COLUMNS
                ),
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut products = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            products.push(Self::from_row(&row).map_err(AppError::from)?);
        }
        Ok(products)
    }

    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(&format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS), [id])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn create(conn: &Connection, data: CreateProduct) -> AppResult<Self> {
        if data.price_cents < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO products (id, name, description, price_cents, image, category, featured, in_stock) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                id.clone(),
                data.name,
                data.description.unwrap_or_default(),
                data.price_cents,
                data.image.unwrap_or_default(),
                data.category.as_str().to_string(),
                data.featured.unwrap_or(false) as i32,
                data.in_stock.unwrap_or(true) as i32
            ],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create product".to_string()))
    }

    pub async fn update(conn: &Connection, id: &str, data: UpdateProduct) -> AppResult<Self> {
        let current = Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let name = data.name.unwrap_or(current.name);
        let description = data.description.unwrap_or(current.description);
        let price_cents = data.price_cents.unwrap_or(current.price_cents);
        let image = data.image.unwrap_or(current.image);
        let category = data.category.unwrap_or(current.category);
        let featured = data.featured.unwrap_or(current.featured) as i32;
        let in_stock = data.in_stock.unwrap_or(current.in_stock) as i32;

        if price_cents < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }

        conn.execute(
            r#"
            UPDATE products SET
                name = ?,
                description = ?,
                price_cents = ?,
                image = ?,
                category = ?,
                featured = ?,
                in_stock = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
            libsql::params![
                name,
                description,
                price_cents,
                image,
                category.as_str().to_string(),
                featured,
                in_stock,
                id.to_string()
            ],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    /// True while order lines or tally lines still point at the product.
    pub async fn is_referenced(conn: &Connection, id: &str) -> AppResult<bool> {
        let mut rows = conn
            .query(
                r#"
                SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = ?1)
                    OR EXISTS(SELECT 1 FROM tally_items WHERE product_id = ?1)
                "#,
                [id],
            )
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(AppError::from)? != 0),
            None => Ok(false),
        }
    }

    pub async fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        conn.execute("DELETE FROM products WHERE id = ?", [id.to_string()])
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, memory_connection};

    fn eggs() -> CreateProduct {
        CreateProduct {
            name: "Kienyeji eggs (tray)".to_string(),
            description: None,
            price_cents: 45_000,
            image: None,
            category: ProductCategory::Eggs,
            featured: None,
            in_stock: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let (_db, conn) = memory_connection().await;
        let product = Product::create(&conn, eggs()).await.unwrap();

        assert_eq!(product.description, "");
        assert_eq!(product.image, "");
        assert!(!product.featured);
        assert!(product.in_stock);
        assert_eq!(product.price(), 450.0);
    }

    #[tokio::test]
    async fn create_keeps_explicit_out_of_stock() {
        let (_db, conn) = memory_connection().await;
        let product = Product::create(
            &conn,
            CreateProduct {
                in_stock: Some(false),
                ..eggs()
            },
        )
        .await
        .unwrap();

        assert!(!product.in_stock);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (_db, conn) = memory_connection().await;
        let product = Product::create(&conn, eggs()).await.unwrap();

        let updated = Product::update(
            &conn,
            &product.id,
            UpdateProduct {
                featured: Some(true),
                category: Some(ProductCategory::Prepared),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(updated.featured);
        assert_eq!(updated.category, ProductCategory::Prepared);
        assert_eq!(updated.name, product.name);
        assert_eq!(updated.price_cents, product.price_cents);
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found() {
        let (_db, conn) = memory_connection().await;
        let err = Product::update(&conn, "missing", UpdateProduct::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn tally_lines_mark_product_as_referenced() {
        let (_db, conn) = memory_connection().await;
        let product = Product::create(&conn, eggs()).await.unwrap();
        assert!(!Product::is_referenced(&conn, &product.id).await.unwrap());

        fixtures::tally_entry(&conn, "te", "2026-10-01 08:00:00").await;
        conn.execute(
            "INSERT INTO tally_items (id, entry_id, product_id, quantity) VALUES ('ti', 'te', ?, 3)",
            [product.id.clone()],
        )
        .await
        .unwrap();

        assert!(Product::is_referenced(&conn, &product.id).await.unwrap());
    }
}
