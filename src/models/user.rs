use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Customer => "CUSTOMER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(UserRole::Admin),
            "CUSTOMER" => Some(UserRole::Customer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        let role: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            address: row.get(4)?,
            role: UserRole::from_str(&role).unwrap_or(UserRole::Customer),
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

/// A customer together with how many orders they have placed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(flatten)]
    pub user: User,
    pub order_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// What still points at a user; a user can only be removed when both are false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReferences {
    pub has_orders: bool,
    pub has_support_tickets: bool,
}

impl UserReferences {
    pub fn any(&self) -> bool {
        self.has_orders || self.has_support_tickets
    }
}

const USER_COLUMNS: &str = "id, name, email, phone, address, role, created_at, updated_at";

impl User {
    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS), [id])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS), [email])
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(Self::from_row(&row).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn list_members(conn: &Connection) -> AppResult<Vec<Member>> {
        let mut rows = conn
            .query(
                r#"
                SELECT u.id, u.name, u.email, u.phone, u.address, u.role, u.created_at, u.updated_at,
                       (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS order_count
                FROM users u
                WHERE u.role = 'CUSTOMER'
                ORDER BY u.created_at DESC, u.rowid DESC
                "#,
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut members = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            members.push(Member {
                user: Self::from_row(&row).map_err(AppError::from)?,
                order_count: row.get(8).map_err(AppError::from)?,
            });
        }
        Ok(members)
    }

    pub async fn list_page(conn: &Connection, limit: i64, offset: i64) -> AppResult<Vec<Self>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM users ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
                    USER_COLUMNS
                ),
                libsql::params![limit, offset],
            )
            .await
            .map_err(AppError::from)?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            users.push(Self::from_row(&row).map_err(AppError::from)?);
        }
        Ok(users)
    }

    pub async fn count_all(conn: &Connection) -> AppResult<i64> {
        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(row.get(0).map_err(AppError::from)?),
            None => Ok(0),
        }
    }

    pub async fn create_member(conn: &Connection, data: CreateMember) -> AppResult<Self> {
        if User::find_by_email(conn, &data.email).await?.is_some() {
            return Err(AppError::Conflict {
                message: "A user with this email already exists".to_string(),
                details: serde_json::json!({ "email": data.email }),
            });
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, name, email, phone, address, role) VALUES (?, ?, ?, ?, ?, ?)",
            libsql::params![
                id.clone(),
                data.name,
                data.email,
                data.phone.unwrap_or_default(),
                data.address.unwrap_or_default(),
                UserRole::Customer.as_str().to_string()
            ],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create member".to_string()))
    }

    pub async fn references(conn: &Connection, id: &str) -> AppResult<UserReferences> {
        let mut rows = conn
            .query(
                r#"
                SELECT
                    EXISTS(SELECT 1 FROM orders WHERE user_id = ?1),
                    EXISTS(SELECT 1 FROM support_tickets WHERE user_id = ?1)
                "#,
                [id],
            )
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(UserReferences {
                has_orders: row.get::<i64>(0).map_err(AppError::from)? != 0,
                has_support_tickets: row.get::<i64>(1).map_err(AppError::from)? != 0,
            }),
            None => Ok(UserReferences {
                has_orders: false,
                has_support_tickets: false,
            }),
        }
    }

    pub async fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        conn.execute("DELETE FROM users WHERE id = ?", [id.to_string()])
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_connection;

    fn member(name: &str, email: &str) -> CreateMember {
        CreateMember {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: Some("Kiambu Road".to_string()),
        }
    }

    #[tokio::test]
    async fn create_member_defaults_to_customer() {
        let (_db, conn) = memory_connection().await;
        let user = User::create_member(&conn, member("Wanjiku", "wanjiku@example.com"))
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.phone, "");
        assert_eq!(user.address, "Kiambu Road");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_db, conn) = memory_connection().await;
        User::create_member(&conn, member("A", "dup@example.com")).await.unwrap();

        let err = User::create_member(&conn, member("B", "dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn members_exclude_admins_and_count_orders() {
        let (_db, conn) = memory_connection().await;
        let customer = User::create_member(&conn, member("Otieno", "otieno@example.com"))
            .await
            .unwrap();
        conn.execute(
            "INSERT INTO users (id, name, email, role) VALUES ('staff', 'Staff', 'staff@example.com', 'ADMIN')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO orders (id, order_number, user_id, total_cents) VALUES ('o1', 'ORD-1', ?, 500)",
            [customer.id.clone()],
        )
        .await
        .unwrap();

        let members = User::list_members(&conn).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user.id, customer.id);
        assert_eq!(members[0].order_count, 1);
    }

    #[tokio::test]
    async fn pages_are_ordered_by_name() {
        let (_db, conn) = memory_connection().await;
        for (name, email) in [("Carol", "c@x.io"), ("Alice", "a@x.io"), ("Bob", "b@x.io")] {
            User::create_member(&conn, member(name, email)).await.unwrap();
        }

        let first = User::list_page(&conn, 2, 0).await.unwrap();
        let second = User::list_page(&conn, 2, 2).await.unwrap();

        let names: Vec<_> = first.iter().chain(second.iter()).map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(User::count_all(&conn).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn references_report_orders_and_tickets() {
        let (_db, conn) = memory_connection().await;
        let user = User::create_member(&conn, member("Njeri", "njeri@example.com"))
            .await
            .unwrap();
        assert!(!User::references(&conn, &user.id).await.unwrap().any());

        conn.execute(
            "INSERT INTO support_tickets (id, user_id, message) VALUES ('t1', ?, 'late delivery')",
            [user.id.clone()],
        )
        .await
        .unwrap();

        let refs = User::references(&conn, &user.id).await.unwrap();
        assert!(!refs.has_orders);
        assert!(refs.has_support_tickets);
    }
}
