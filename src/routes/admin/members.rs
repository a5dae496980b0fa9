use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{CreateMember, Member, User};
use crate::routes::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
}

async fn list_members(State(state): State<AppState>) -> AppResult<Json<Vec<Member>>> {
    let conn = state.conn()?;
    Ok(Json(User::list_members(&conn).await?))
}

async fn create_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<User>)> {
    if payload.name.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Name and a valid email are required".to_string()));
    }

    let conn = state.conn()?;
    let user = User::create_member(&conn, payload).await?;
    tracing::info!("Created member {}", user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<UserPage>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 || limit < 1 {
        return Err(AppError::BadRequest("page and limit must be at least 1".to_string()));
    }
    let limit = limit.min(MAX_PAGE_SIZE);

    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest("page is out of range".to_string()))?;

    let conn = state.conn()?;
    let total = User::count_all(&conn).await?;
    let users = User::list_page(&conn, limit, offset).await?;

    Ok(Json(UserPage {
        users,
        pagination: Pagination {
            total,
            pages: (total + limit - 1) / limit,
            page,
            limit,
        },
    }))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conn = state.conn()?;
    User::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let references = User::references(&conn, &id).await?;
    if references.any() {
        return Err(AppError::Conflict {
            message: "Cannot delete user with associated records".to_string(),
            details: json!(references),
        });
    }

    User::delete(&conn, &id).await?;
    tracing::info!("Deleted user {}", id);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
