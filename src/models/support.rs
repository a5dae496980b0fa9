use libsql::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    New,
    Open,
    Processing,
    Closed,
    Archived,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "NEW",
            TicketStatus::Open => "OPEN",
            TicketStatus::Processing => "PROCESSING",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Archived => "ARCHIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(TicketStatus::New),
            "OPEN" => Some(TicketStatus::Open),
            "PROCESSING" => Some(TicketStatus::Processing),
            "CLOSED" => Some(TicketStatus::Closed),
            "ARCHIVED" => Some(TicketStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl SupportTicket {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        let status: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            message: row.get(2)?,
            status: TicketStatus::from_str(&status).unwrap_or(TicketStatus::New),
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResponse {
    pub id: String,
    pub ticket_id: String,
    pub message: String,
    pub responded_by: String,
    pub created_at: String,
}

impl SupportResponse {
    fn from_row(row: &libsql::Row) -> Result<Self, libsql::Error> {
        Ok(Self {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            message: row.get(2)?,
            responded_by: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub message: String,
    pub responded_by: String,
    #[serde(default)]
    pub close_ticket: bool,
}

const TICKET_COLUMNS: &str = "id, user_id, message, status, created_at, updated_at";

impl SupportTicket {
    pub async fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<Self>> {
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM support_tickets WHERE id = ?", TICKET_COLUMNS),
                [id],
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
                    "SELECT {} FROM support_tickets ORDER BY created_at DESC, rowid DESC",
                    TICKET_COLUMNS
                ),
                (),
            )
            .await
            .map_err(AppError::from)?;

        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            tickets.push(Self::from_row(&row).map_err(AppError::from)?);
        }
        Ok(tickets)
    }

    pub async fn create(conn: &Connection, data: CreateTicket) -> AppResult<Self> {
        if data.message.trim().is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO support_tickets (id, user_id, message, status) VALUES (?, ?, ?, ?)",
            libsql::params![id.clone(), data.user_id, data.message, TicketStatus::New.as_str().to_string()],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create support ticket".to_string()))
    }

    pub async fn set_status(conn: &Connection, id: &str, status: TicketStatus) -> AppResult<Self> {
        conn.execute(
            "UPDATE support_tickets SET status = ?, updated_at = datetime('now') WHERE id = ?",
            libsql::params![status.as_str().to_string(), id.to_string()],
        )
        .await
        .map_err(AppError::from)?;

        Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Support ticket not found".to_string()))
    }

    /// Loads a ticket for an admin. Viewing a NEW ticket acknowledges it as OPEN.
    pub async fn open_for_review(conn: &Connection, id: &str) -> AppResult<Self> {
        let ticket = Self::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Support ticket not found".to_string()))?;

        if ticket.status == TicketStatus::New {
            return Self::set_status(conn, id, TicketStatus::Open).await;
        }
        Ok(ticket)
    }

    pub async fn responses(conn: &Connection, ticket_id: &str) -> AppResult<Vec<SupportResponse>> {
        let mut rows = conn
            .query(
                "SELECT id, ticket_id, message, responded_by, created_at FROM support_responses WHERE ticket_id = ? ORDER BY created_at ASC, rowid ASC",
                [ticket_id],
            )
            .await
            .map_err(AppError::from)?;

        let mut responses = Vec::new();
        while let Some(row) = rows.next().await.map_err(AppError::from)? {
            responses.push(SupportResponse::from_row(&row).map_err(AppError::from)?);
        }
        Ok(responses)
    }

    /// Records an admin reply. The ticket is closed when asked to, otherwise it moves to PROCESSING.
    pub async fn respond(conn: &Connection, ticket_id: &str, data: CreateResponse) -> AppResult<SupportResponse> {
        Self::find_by_id(conn, ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Support ticket not found".to_string()))?;

        if data.message.trim().is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO support_responses (id, ticket_id, message, responded_by) VALUES (?, ?, ?, ?)",
            libsql::params![id.clone(), ticket_id.to_string(), data.message, data.responded_by],
        )
        .await
        .map_err(AppError::from)?;

        let next = if data.close_ticket {
            TicketStatus::Closed
        } else {
            TicketStatus::Processing
        };
        Self::set_status(conn, ticket_id, next).await?;

        let mut rows = conn
            .query(
                "SELECT id, ticket_id, message, responded_by, created_at FROM support_responses WHERE id = ?",
                [id],
            )
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(SupportResponse::from_row(&row).map_err(AppError::from)?),
            None => Err(AppError::Internal("Failed to create support response".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, memory_connection};

    async fn ticket(conn: &Connection) -> SupportTicket {
        fixtures::customer(conn, "u1", "Achieng").await;
        SupportTicket::create(
            conn,
            CreateTicket {
                user_id: "u1".to_string(),
                message: "My eggs arrived cracked".to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn reply(close_ticket: bool) -> CreateResponse {
        CreateResponse {
            message: "Sorry, a replacement is on the way".to_string(),
            responded_by: "Support desk".to_string(),
            close_ticket,
        }
    }

    #[tokio::test]
    async fn new_ticket_opens_when_viewed() {
        let (_db, conn) = memory_connection().await;
        let ticket = ticket(&conn).await;
        assert_eq!(ticket.status, TicketStatus::New);

        let viewed = SupportTicket::open_for_review(&conn, &ticket.id).await.unwrap();
        assert_eq!(viewed.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn viewing_does_not_reopen_closed_ticket() {
        let (_db, conn) = memory_connection().await;
        let ticket = ticket(&conn).await;
        SupportTicket::set_status(&conn, &ticket.id, TicketStatus::Closed).await.unwrap();

        let viewed = SupportTicket::open_for_review(&conn, &ticket.id).await.unwrap();
        assert_eq!(viewed.status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn reply_moves_ticket_to_processing() {
        let (_db, conn) = memory_connection().await;
        let ticket = ticket(&conn).await;

        let response = SupportTicket::respond(&conn, &ticket.id, reply(false)).await.unwrap();
        assert_eq!(response.ticket_id, ticket.id);

        let stored = SupportTicket::find_by_id(&conn, &ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Processing);
        assert_eq!(SupportTicket::responses(&conn, &ticket.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reply_can_close_ticket() {
        let (_db, conn) = memory_connection().await;
        let ticket = ticket(&conn).await;

        SupportTicket::respond(&conn, &ticket.id, reply(true)).await.unwrap();

        let stored = SupportTicket::find_by_id(&conn, &ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn reply_to_missing_ticket_is_not_found() {
        let (_db, conn) = memory_connection().await;
        let err = SupportTicket::respond(&conn, "missing", reply(false)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
