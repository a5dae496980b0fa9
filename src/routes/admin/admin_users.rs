use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::error::{AppError, AppResult};
use crate::models::{AdminUser, CreateAdminUser};
use crate::routes::AppState;
use crate::services::auth::hash_password;

const MIN_PASSWORD_LEN: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin-users", get(list_admins).post(create_admin))
}

async fn list_admins(State(state): State<AppState>) -> AppResult<Json<Vec<AdminUser>>> {
    let conn = state.conn()?;
    Ok(Json(AdminUser::list_all(&conn).await?))
}

async fn create_admin(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdminUser>,
) -> AppResult<(StatusCode, Json<AdminUser>)> {
    if payload.name.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Name and a valid email are required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let conn = state.conn()?;
    let admin = AdminUser::create(
        &conn,
        payload.name.trim(),
        payload.email.trim(),
        &password_hash,
        payload.role,
    )
    .await?;

    tracing::info!("Created {} admin {}", admin.role.as_str(), admin.email);
    Ok((StatusCode::CREATED, Json(admin)))
}
