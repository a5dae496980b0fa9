use chrono::NaiveDate;
use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::product::Product;

/// One production log sheet: what the farm recorded on a given day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    pub id: String,
    pub date: NaiveDate,
    pub created_at: String,
}

impl TallyEntry {
    fn from_row(row: &libsql::Row) -> AppResult<Self> {
        let date: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| AppError::Internal(format!("Invalid tally date {:?}: {}", date, e)))?;
        Ok(Self {
            id: row.get(0)?,
            date,
            created_at: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyItem {
    pub id: String,
    pub entry_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub notes: String,
}

impl TallyItem {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        Ok(Self {
            id: row.get(0)?,
            entry_id: row.get(1)?,
            product_id: row.get(2)?,
            quantity: row.get(3)?,
            notes: row.get(4)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTallyItem {
    pub product_id: String,
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTallyEntry {
    pub date: NaiveDate,
    pub items: Vec<CreateTallyItem>,
}

impl TallyEntry {
    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query("SELECT id, date, created_at FROM tally_entries WHERE id = ?", [id])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(conn: &Connection) -> AppResult<Vec<Self>> {
        let mut rows = conn
            .query(
                "SELECT id, date, created_at FROM tally_entries ORDER BY date DESC, created_at DESC",
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            entries.push(Self::from_row(&row)?);
        }
        Ok(entries)
    }

    pub async fn create(conn: &Connection, data: CreateTallyEntry) -> AppResult<Self> {
        if data.items.is_empty() {
            return Err(AppError::BadRequest("Tally entry must contain at least one item".to_string()));
        }
        if data.items.iter().any(|item| item.quantity <= 0) {
            return Err(AppError::BadRequest("Tally quantities must be positive".to_string()));
        }
        for item in &data.items {
            if Product::find_by_id(conn, &item.product_id).await?.is_none() {
                return Err(AppError::BadRequest(format!("Unknown product: {}", item.product_id)));
            }
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO tally_entries (id, date) VALUES (?, ?)",
            libsql::params![id.clone(), data.date.format("%Y-%m-%d").to_string()],
        )
        .await
        .map_err(AppError::from)?;

        for item in data.items {
            conn.execute(
                "INSERT INTO tally_items (id, entry_id, product_id, quantity, notes) VALUES (?, ?, ?, ?, ?)",
                libsql::params![
                    Uuid::new_v4().to_string(),
                    id.clone(),
                    item.product_id,
                    item.quantity,
                    item.notes.unwrap_or_default()
                ],
            )
            .await
            .map_err(AppError::from)?;
        }

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create tally entry".to_string()))
    }

    pub async fn get_items(conn: &Connection, entry_id: &str) -> AppResult<Vec<TallyItem>> {
        let mut rows = conn
            .query(
                "SELECT id, entry_id, product_id, quantity, notes FROM tally_items WHERE entry_id = ? ORDER BY rowid",
                [entry_id],
            )
            .await
            .map_err(AppError::from)?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            items.push(TallyItem::from_row(&row).map_err(AppError::from)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, memory_connection};

    fn entry(date: &str, quantities: &[i64]) -> CreateTallyEntry {
        CreateTallyEntry {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            items: quantities
                .iter()
                .map(|&quantity| CreateTallyItem {
                    product_id: "eggs".to_string(),
                    quantity,
                    notes: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn entries_list_newest_date_first() {
        let (_db, conn) = memory_connection().await;
        fixtures::product(&conn, "eggs", "eggs").await;

        TallyEntry::create(&conn, entry("2026-10-01", &[120])).await.unwrap();
        let latest = TallyEntry::create(&conn, entry("2026-10-03", &[90, 30])).await.unwrap();

        let entries = TallyEntry::list_all(&conn).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, latest.id);

        let items = TallyEntry::get_items(&conn, &latest.id).await.unwrap();
        assert_eq!(items.iter().map(|i| i.quantity).sum::<i64>(), 120);
        assert_eq!(items[0].notes, "");
    }

    #[tokio::test]
    async fn rejects_empty_and_non_positive_entries() {
        let (_db, conn) = memory_connection().await;

        let empty = TallyEntry::create(&conn, entry("2026-10-01", &[])).await.unwrap_err();
        assert!(matches!(empty, AppError::BadRequest(_)));

        let negative = TallyEntry::create(&conn, entry("2026-10-01", &[-3])).await.unwrap_err();
        assert!(matches!(negative, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_products() {
        let (_db, conn) = memory_connection().await;
        let err = TallyEntry::create(&conn, entry("2026-10-01", &[5])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(TallyEntry::list_all(&conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_stored_date_is_an_error() {
        let (_db, conn) = memory_connection().await;
        fixtures::tally_entry(&conn, "bad", "2026-13-45 06:00:00").await;

        let err = TallyEntry::list_all(&conn).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(TallyEntry::find_by_id(&conn, "bad").await.is_err());
    }
}
