mod pool;
mod schema;

pub use pool::create_database;
pub use schema::migrate;

/// Timestamps are stored as UTC text in SQLite's own `datetime()` layout so that
/// values written by `datetime('now')` and values bound from Rust compare correctly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_sql_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
pub(crate) async fn memory_connection() -> (libsql::Database, libsql::Connection) {
    let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
    let conn = db.connect().unwrap();
    migrate(&conn).await.unwrap();
    (db, conn)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use libsql::Connection;

    pub async fn customer(conn: &Connection, id: &str, name: &str) {
        conn.execute(
            "INSERT INTO users (id, name, email) VALUES (?, ?, ?)",
            libsql::params![id.to_string(), name.to_string(), format!("{}@example.com", id)],
        )
        .await
        .unwrap();
    }

    pub async fn product(conn: &Connection, id: &str, category: &str) {
        conn.execute(
            "INSERT INTO products (id, name, price_cents, category) VALUES (?, ?, 1000, ?)",
            libsql::params![id.to_string(), format!("Product {}", id), category.to_string()],
        )
        .await
        .unwrap();
    }

    pub async fn tally_entry(conn: &Connection, id: &str, created_at: &str) {
        conn.execute(
            "INSERT INTO tally_entries (id, date, created_at) VALUES (?, ?, ?)",
            libsql::params![id.to_string(), created_at[..10].to_string(), created_at.to_string()],
        )
        .await
        .unwrap();
    }
}
