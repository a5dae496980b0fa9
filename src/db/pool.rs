use libsql::{Builder, Database};

use crate::error::{AppError, AppResult};

pub async fn create_database(database_url: &str, auth_token: Option<&str>) -> AppResult<Database> {
    // Turso remote URL
    if database_url.starts_with("libsql://") {
        let auth_token = auth_token.ok_or_else(|| {
            AppError::Internal("TURSO_AUTH_TOKEN must be set for remote database".to_string())
        })?;

        Ok(Builder::new_remote(database_url.to_string(), auth_token.to_string())
            .build()
            .await?)
    } else {
        // Local SQLite file
        let path = database_url
            .strip_prefix("sqlite:")
            .unwrap_or(database_url)
            .split('?')
            .next()
            .unwrap_or("freshom.db");

        Ok(Builder::new_local(path).build().await?)
    }
}
