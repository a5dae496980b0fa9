use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::routes::AppState;
use crate::services::image::{decode_data_url, process_image};

const UPLOAD_FOLDER: &str = "freshom";
/// Base64 inflates payloads by a third; this leaves room for ~10 MB images.
const MAX_UPLOAD_BODY: usize = 14 * 1024 * 1024;

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY))
}

async fn upload_image(
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> AppResult<Json<UploadResponse>> {
    let (mime, data) = decode_data_url(&payload.file)?;
    let processed = process_image(&data, &mime)?;

    let path = state
        .storage
        .upload_to_folder(
            UPLOAD_FOLDER,
            &processed.extension,
            &processed.content_type,
            &processed.data,
        )
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let url = state.storage.public_url(&path);
    tracing::info!("Uploaded image to {}", url);
    Ok(Json(UploadResponse { url }))
}
