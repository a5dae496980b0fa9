use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Delivery,
    Support,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "SUPER_ADMIN",
            AdminRole::Admin => "ADMIN",
            AdminRole::Delivery => "DELIVERY",
            AdminRole::Support => "SUPPORT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SUPER_ADMIN" => Some(AdminRole::SuperAdmin),
            "ADMIN" => Some(AdminRole::Admin),
            "DELIVERY" => Some(AdminRole::Delivery),
            "SUPPORT" => Some(AdminRole::Support),
            _ => None,
        }
    }

    /// Roles allowed to create and list other admin accounts.
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AdminRole,
    pub last_active: Option<String>,
    pub created_at: String,
}

impl AdminUser {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        let role: String = row.get(4)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: AdminRole::from_str(&role).unwrap_or(AdminRole::Support),
            last_active: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: AdminRole,
}

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, role, last_active, created_at";

impl AdminUser {
    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(&format!("SELECT {} FROM admin_users WHERE id = ?", ADMIN_COLUMNS), [id])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM admin_users WHERE email = ? COLLATE NOCASE", ADMIN_COLUMNS),
                [email],
            )
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
                    "SELECT {} FROM admin_users ORDER BY created_at DESC, rowid DESC",
                    ADMIN_COLUMNS
                ),
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut admins = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            admins.push(Self::from_row(&row).map_err(AppError::from)?);
        }
        Ok(admins)
    }

    pub async fn count_all(conn: &Connection) -> AppResult<i64> {
        let mut rows = conn
            .query("SELECT COUNT(*) FROM admin_users", ())
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(row.get(0).map_err(AppError::from)?),
            None => Ok(0),
        }
    }

    /// Inserts an admin whose password has already been hashed.
    pub async fn create(
        conn: &Connection,
        name: &str,
        email: &str,
        password_hash: &str,
        role: AdminRole,
    ) -> AppResult<Self> {
        if Self::find_by_email(conn, email).await?.is_some() {
            return Err(AppError::Conflict {
                message: "An admin with this email already exists".to_string(),
                details: serde_json::json!({ "email": email }),
            });
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO admin_users (id, name, email, password_hash, role, last_active) VALUES (?, ?, ?, ?, ?, datetime('now'))",
            libsql::params![id.clone(), name.to_string(), email.to_string(), password_hash.to_string(), role.as_str().to_string()],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create admin user".to_string()))
    }

    pub async fn touch_last_active(conn: &Connection, id: &str) -> AppResult<()> {
        conn.execute(
            "UPDATE admin_users SET last_active = datetime('now') WHERE id = ?",
            [id.to_string()],
        )
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_connection;

    #[tokio::test]
    async fn password_hash_is_never_serialized() {
        let (_db, conn) = memory_connection().await;
        let admin = AdminUser::create(&conn, "Grace", "grace@freshom.co.ke", "$argon2id$fake", AdminRole::Delivery)
            .await
            .unwrap();

        let json = serde_json::to_value(&admin).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "DELIVERY");
        assert!(admin.last_active.is_some());
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let (_db, conn) = memory_connection().await;
        AdminUser::create(&conn, "Grace", "grace@freshom.co.ke", "h", AdminRole::Admin)
            .await
            .unwrap();

        let found = AdminUser::find_by_email(&conn, "Grace@Freshom.co.ke").await.unwrap();
        assert!(found.is_some());

        let err = AdminUser::create(&conn, "Other", "GRACE@freshom.co.ke", "h", AdminRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[test]
    fn only_admin_roles_manage_admins() {
        assert!(AdminRole::SuperAdmin.can_manage_admins());
        assert!(AdminRole::Admin.can_manage_admins());
        assert!(!AdminRole::Delivery.can_manage_admins());
        assert!(!AdminRole::Support.can_manage_admins());
    }
}
