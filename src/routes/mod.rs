pub mod admin;
pub mod auth;

use axum::Router;
use libsql::{Connection, Database};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{EmailService, RateLimiter};
use crate::storage::StorageBackend;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub email: Option<EmailService>,
    pub storage: Arc<dyn StorageBackend>,
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn conn(&self) -> AppResult<Connection> {
        self.db.connect().map_err(AppError::from)
    }
}

pub fn create_router(state: AppState) -> Router {
    if state.config.testing_mode {
        tracing::warn!("TESTING MODE ENABLED - Admin auth is disabled!");
    }

    let api = Router::new()
        .merge(auth::routes(state.clone()))
        .merge(admin::routes(state.clone()));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback_service(ServeDir::new("static").fallback(ServeFile::new("static/index.html")))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
