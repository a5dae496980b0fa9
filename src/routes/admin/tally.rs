use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use libsql::Connection;
use serde::Serialize;

use crate::error::AppResult;
use crate::models::{CreateTallyEntry, Product, TallyEntry, TallyItem};
use crate::routes::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntryResponse {
    #[serde(flatten)]
    pub entry: TallyEntry,
    pub items: Vec<TallyItemResponse>,
}

#[derive(Serialize)]
pub struct TallyItemResponse {
    #[serde(flatten)]
    pub item: TallyItem,
    pub product: Option<Product>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/tally", get(list_entries).post(create_entry))
}

async fn with_items(conn: &Connection, entry: TallyEntry) -> AppResult<TallyEntryResponse> {
    let mut items = Vec::new();
    for item in TallyEntry::get_items(conn, &entry.id).await? {
        let product = Product::find_by_id(conn, &item.product_id).await?;
        items.push(TallyItemResponse { item, product });
    }
    Ok(TallyEntryResponse { entry, items })
}

async fn list_entries(State(state): State<AppState>) -> AppResult<Json<Vec<TallyEntryResponse>>> {
    let conn = state.conn()?;
    let mut entries = Vec::new();
    for entry in TallyEntry::list_all(&conn).await? {
        entries.push(with_items(&conn, entry).await?);
    }
    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateTallyEntry>,
) -> AppResult<(StatusCode, Json<TallyEntryResponse>)> {
    let conn = state.conn()?;
    let entry = TallyEntry::create(&conn, payload).await?;
    tracing::info!("Recorded tally for {}", entry.date);
    Ok((StatusCode::CREATED, Json(with_items(&conn, entry).await?)))
}
