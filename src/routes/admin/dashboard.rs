use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::error::AppResult;
use crate::metrics::{build_snapshot, DashboardSnapshot, LibsqlMetricsSource};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardSnapshot>> {
    let source = LibsqlMetricsSource::new(state.conn()?);
    let snapshot = build_snapshot(&source, Utc::now()).await?;
    Ok(Json(snapshot))
}
