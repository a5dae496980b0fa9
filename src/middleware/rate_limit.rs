use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::routes::AppState;

/// Client address as reported by the proxy in front of the service.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Throttles login attempts per client IP. Limiter errors let the request through.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref rate_limiter) = state.rate_limiter {
        let ip = client_ip(req.headers());
        match rate_limiter.check_login(&ip).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Login rate limit exceeded for IP: {}", ip);
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "Too many login attempts",
                        "retryAfter": 60
                    })),
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!("Rate limiter error: {} - allowing request", e);
            }
        }
    }

    next.run(req).await
}
