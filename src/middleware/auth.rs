use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{AdminRole, AdminUser};
use crate::routes::AppState;
use crate::services::auth::validate_token;

/// The admin behind the current request, inserted by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub id: String,
    pub email: String,
    pub role: AdminRole,
}

impl From<AdminUser> for AuthAdmin {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            role: admin.role,
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(t) => t,
        None => return unauthorized("Missing authorization header"),
    };

    let claims = match validate_token(token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("JWT rejected: {}", e);
            return unauthorized("Invalid token");
        }
    };

    let conn = match state.db.connect() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Database error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response();
        }
    };

    let admin = match AdminUser::find_by_id(&conn, &claims.sub).await {
        Ok(Some(admin)) => admin,
        Ok(None) => return unauthorized("Admin not found"),
        Err(e) => return e.into_response(),
    };

    let admin = AuthAdmin::from(admin);
    tracing::debug!(admin = %admin.email, role = admin.role.as_str(), "Authenticated request");
    req.extensions_mut().insert(admin);
    next.run(req).await
}

/// Only SUPER_ADMIN and ADMIN may manage other admin accounts.
pub async fn require_admin_manager(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<AuthAdmin>() {
        Some(admin) if admin.role.can_manage_admins() => next.run(req).await,
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Insufficient role"})),
        )
            .into_response(),
        None => unauthorized("Authentication required"),
    }
}
