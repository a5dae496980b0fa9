use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libsql::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{CreateResponse, CreateTicket, SupportResponse, SupportTicket, TicketStatus, User};
use crate::routes::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub user: Option<User>,
    pub responses: Vec<SupportResponse>,
}

#[derive(Deserialize)]
pub struct UpdateTicketStatus {
    pub status: TicketStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/support", get(list_tickets).post(create_ticket))
        .route("/support/{id}", get(get_ticket).put(update_ticket))
        .route("/support/{id}/response", post(respond_to_ticket))
}

async fn with_details(conn: &Connection, ticket: SupportTicket) -> AppResult<TicketResponse> {
    let user = User::find_by_id(conn, &ticket.user_id).await?;
    let responses = SupportTicket::responses(conn, &ticket.id).await?;
    Ok(TicketResponse {
        ticket,
        user,
        responses,
    })
}

async fn list_tickets(State(state): State<AppState>) -> AppResult<Json<Vec<TicketResponse>>> {
    let conn = state.conn()?;
    let mut tickets = Vec::new();
    for ticket in SupportTicket::list_all(&conn).await? {
        tickets.push(with_details(&conn, ticket).await?);
    }
    Ok(Json(tickets))
}

async fn create_ticket(
    State(state): State<AppState>,
    Json(payload): Json<CreateTicket>,
) -> AppResult<(StatusCode, Json<TicketResponse>)> {
    let conn = state.conn()?;
    if User::find_by_id(&conn, &payload.user_id).await?.is_none() {
        return Err(AppError::BadRequest("Unknown user".to_string()));
    }

    let ticket = SupportTicket::create(&conn, payload).await?;
    tracing::info!("Opened support ticket {}", ticket.id);
    Ok((StatusCode::CREATED, Json(with_details(&conn, ticket).await?)))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TicketResponse>> {
    let conn = state.conn()?;
    let ticket = SupportTicket::open_for_review(&conn, &id).await?;
    Ok(Json(with_details(&conn, ticket).await?))
}

async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicketStatus>,
) -> AppResult<Json<TicketResponse>> {
    let conn = state.conn()?;
    let ticket = SupportTicket::set_status(&conn, &id, payload.status).await?;
    Ok(Json(with_details(&conn, ticket).await?))
}

async fn respond_to_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateResponse>,
) -> AppResult<(StatusCode, Json<SupportResponse>)> {
    let conn = state.conn()?;
    let response = SupportTicket::respond(&conn, &id, payload).await?;
    tracing::info!("{} responded to ticket {}", response.responded_by, id);
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db::fixtures;
    use crate::routes::test_support::TestApp;

    #[tokio::test]
    async fn ticket_workflow() {
        let app = TestApp::new(false).await;
        let token = app.login().await;
        fixtures::customer(&app.state.conn().unwrap(), "otieno", "Otieno").await;

        let (status, created) = app
            .request(
                "POST",
                "/api/support",
                Some(&token),
                Some(json!({ "userId": "otieno", "message": "Eggs arrived cracked" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "NEW");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, viewed) = app
            .request("GET", &format!("/api/support/{}", id), Some(&token), None)
            .await;
        assert_eq!(viewed["status"], "OPEN");
        assert_eq!(viewed["user"]["name"], "Otieno");

        let (status, reply) = app
            .request(
                "POST",
                &format!("/api/support/{}/response", id),
                Some(&token),
                Some(json!({ "message": "Replacement tray on the way", "respondedBy": "Boss" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reply["respondedBy"], "Boss");

        let (_, list) = app.request("GET", "/api/support", Some(&token), None).await;
        assert_eq!(list[0]["status"], "PROCESSING");
        assert_eq!(list[0]["responses"].as_array().unwrap().len(), 1);

        let (status, archived) = app
            .request(
                "PUT",
                &format!("/api/support/{}", id),
                Some(&token),
                Some(json!({ "status": "ARCHIVED" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(archived["status"], "ARCHIVED");
    }

    #[tokio::test]
    async fn missing_ticket_and_unknown_user() {
        let app = TestApp::new(false).await;
        let token = app.login().await;

        let (status, _) = app.request("GET", "/api/support/nope", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .request(
                "POST",
                "/api/support",
                Some(&token),
                Some(json!({ "userId": "ghost", "message": "hello" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
