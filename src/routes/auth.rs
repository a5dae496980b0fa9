use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::{auth_middleware, login_rate_limit, AuthAdmin};
use crate::models::AdminUser;
use crate::routes::AppState;
use crate::services::auth::{issue_token, verify_password};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub admin: AdminUser,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let me = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    login.merge(me)
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let conn = state.conn()?;
    let admin = AdminUser::find_by_email(&conn, payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &admin.password_hash)? {
        tracing::warn!("Failed login for {}", admin.email);
        return Err(invalid());
    }

    AdminUser::touch_last_active(&conn, &admin.id).await?;
    let admin = AdminUser::find_by_id(&conn, &admin.id)
        .await?
        .ok_or_else(invalid)?;

    let issued = issue_token(&admin, &state.config.jwt_secret, state.config.token_ttl_hours)?;
    tracing::info!("Admin {} logged in", admin.email);

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: issued.token_type,
        expires_in: issued.expires_in,
        admin,
    }))
}

async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<AuthAdmin>,
) -> AppResult<Json<AdminUser>> {
    let conn = state.conn()?;
    let admin = AdminUser::find_by_id(&conn, &current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;
    Ok(Json(admin))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{TestApp, ADMIN_EMAIL};

    #[tokio::test]
    async fn login_returns_bearer_token_and_me_resolves_it() {
        let app = TestApp::new(false).await;
        let token = app.login().await;

        let (status, body) = app.request("GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], ADMIN_EMAIL);
        assert_eq!(body["role"], "SUPER_ADMIN");
        assert!(body.get("passwordHash").is_none());
        assert!(body["lastActive"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::new(false).await;

        let (s1, b1) = app
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": "nope" })),
            )
            .await;
        let (s2, b2) = app
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "nobody@freshom.test", "password": "nope" })),
            )
            .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let app = TestApp::new(false).await;
        let (status, _) = app.request("GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.request("GET", "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
