use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let conn = state.conn()?;
    Ok(Json(Product::list_all(&conn).await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let conn = state.conn()?;
    let product = Product::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }

    let conn = state.conn()?;
    let product = Product::create(&conn, payload).await?;
    tracing::info!("Created product {} ({})", product.name, product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProduct>,
) -> AppResult<Json<Product>> {
    let conn = state.conn()?;
    let before = Product::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let product = Product::update(&conn, &id, payload).await?;
    if before.image != product.image {
        remove_stored_image(&state, &before.image).await;
    }
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conn = state.conn()?;
    let product = Product::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if Product::is_referenced(&conn, &id).await? {
        return Err(AppError::Conflict {
            message: "Product is used by orders or tally entries".to_string(),
            details: json!({ "productId": id }),
        });
    }

    Product::delete(&conn, &id).await?;
    remove_stored_image(&state, &product.image).await;
    tracing::info!("Deleted product {}", id);
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

async fn remove_stored_image(state: &AppState, url: &str) {
    let Some(path) = state.storage.stored_path(url) else {
        return;
    };
    if let Err(e) = state.storage.delete(&path).await {
        tracing::warn!("Failed to delete image {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db::fixtures;
    use crate::routes::test_support::TestApp;

    #[tokio::test]
    async fn product_lifecycle() {
        let app = TestApp::new(false).await;
        let token = app.login().await;

        let (status, created) = app
            .request(
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Broiler (whole)", "priceCents": 85000, "category": "meat" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["inStock"], true);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = app
            .request(
                "PUT",
                &format!("/api/products/{}", id),
                Some(&token),
                Some(json!({ "featured": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["featured"], true);
        assert_eq!(updated["priceCents"], 85000);

        let (status, _) = app
            .request("DELETE", &format!("/api/products/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .request("GET", &format!("/api/products/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn referenced_product_cannot_be_deleted() {
        let app = TestApp::new(false).await;
        let token = app.login().await;
        let conn = app.state.conn().unwrap();
        fixtures::product(&conn, "eggs", "eggs").await;
        fixtures::tally_entry(&conn, "te", "2026-10-01 06:00:00").await;
        conn.execute(
            "INSERT INTO tally_items (id, entry_id, product_id, quantity) VALUES ('ti', 'te', 'eggs', 30)",
            (),
        )
        .await
        .unwrap();

        let (status, body) = app.request("DELETE", "/api/products/eggs", Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["productId"], "eggs");
    }

    #[tokio::test]
    async fn deleting_a_product_removes_its_uploaded_image() {
        let app = TestApp::new(false).await;
        let token = app.login().await;

        let path = app
            .state
            .storage
            .upload_to_folder("freshom", "png", "image/png", b"tray")
            .await
            .unwrap();
        let url = app.state.storage.public_url(&path);

        let (_, created) = app
            .request(
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Tray of 30", "priceCents": 45000, "category": "eggs", "image": url })),
            )
            .await;
        let id = created["id"].as_str().unwrap();

        let on_disk = std::path::Path::new(&app.state.config.upload_dir)
            .join(path.trim_start_matches("/uploads/"));
        assert!(on_disk.exists());

        let (status, _) = app
            .request("DELETE", &format!("/api/products/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let app = TestApp::new(false).await;
        let token = app.login().await;
        let (status, _) = app
            .request(
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Manure", "priceCents": 100, "category": "fertilizer" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
