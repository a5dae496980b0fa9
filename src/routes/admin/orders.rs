use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use libsql::Connection;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{CreateOrder, Order, OrderItem, Product, UpdateOrder, User};
use crate::routes::AppState;
use crate::services::email::{customer_name, EmailLine};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub total: f64,
    pub user: Option<OrderUserInfo>,
    pub items: Vec<AdminOrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderUserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderItemResponse {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).put(update_order))
}

async fn build_order_response(conn: &Connection, order: Order) -> AppResult<AdminOrderResponse> {
    let user = User::find_by_id(conn, &order.user_id)
        .await?
        .map(|u| OrderUserInfo {
            id: u.id,
            name: u.name,
            email: u.email,
        });

    let mut items = Vec::new();
    for item in Order::get_items(conn, &order.id).await? {
        let product = Product::find_by_id(conn, &item.product_id).await?;
        items.push(AdminOrderItemResponse { item, product });
    }

    Ok(AdminOrderResponse {
        total: order.total(),
        order,
        user,
        items,
    })
}

async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<AdminOrderResponse>>> {
    let conn = state.conn()?;
    let orders = Order::list_all(&conn).await?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        responses.push(build_order_response(&conn, order).await?);
    }
    Ok(Json(responses))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AdminOrderResponse>> {
    let conn = state.conn()?;
    let order = Order::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(build_order_response(&conn, order).await?))
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<AdminOrderResponse>)> {
    let conn = state.conn()?;
    let order = Order::create(&conn, payload).await?;
    tracing::info!("Created order {}", order.order_number);
    Ok((StatusCode::CREATED, Json(build_order_response(&conn, order).await?)))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrder>,
) -> AppResult<Json<AdminOrderResponse>> {
    let conn = state.conn()?;
    let before = Order::find_by_id(&conn, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let order = Order::update(&conn, &id, payload).await?;
    let response = build_order_response(&conn, order).await?;

    let status_changed = before.order_status != response.order.order_status
        || before.payment_status != response.order.payment_status;
    if status_changed {
        notify_status_change(&state, &conn, &response).await;
    }

    Ok(Json(response))
}

async fn notify_status_change(state: &AppState, conn: &Connection, response: &AdminOrderResponse) {
    let Some(ref email_service) = state.email else {
        tracing::debug!("Email not configured, skipping status email for {}", response.order.order_number);
        return;
    };

    let user = match User::find_by_id(conn, &response.order.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Order {} has no buyer to notify", response.order.order_number);
            return;
        }
        Err(e) => {
            tracing::error!("Failed to load buyer for {}: {}", response.order.order_number, e);
            return;
        }
    };

    let lines: Vec<EmailLine> = response
        .items
        .iter()
        .map(|line| EmailLine {
            name: line
                .product
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Product".to_string()),
            quantity: line.item.quantity,
            price_cents: line.item.price_cents,
        })
        .collect();

    let name = customer_name(&user.name, &user.email);
    if let Err(e) = email_service
        .send_order_status(&user.email, &response.order, &name, &lines)
        .await
    {
        tracing::error!("Failed to send status email for {}: {}", response.order.order_number, e);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db::fixtures;
    use crate::routes::test_support::TestApp;

    async fn seeded() -> (TestApp, String) {
        let app = TestApp::new(false).await;
        let token = app.login().await;
        let conn = app.state.conn().unwrap();
        fixtures::customer(&conn, "wanjiku", "Wanjiku").await;
        fixtures::product(&conn, "eggs", "eggs").await;
        (app, token)
    }

    fn new_order() -> serde_json::Value {
        json!({
            "userId": "wanjiku",
            "totalCents": 60000,
            "deliveryOption": "delivery",
            "paymentMethod": "mpesa",
            "location": "Kilimani",
            "items": [{ "productId": "eggs", "quantity": 2, "priceCents": 30000 }]
        })
    }

    #[tokio::test]
    async fn create_then_fetch_with_user_and_products() {
        let (app, token) = seeded().await;

        let (status, created) = app.request("POST", "/api/orders", Some(&token), Some(new_order())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["orderNumber"].as_str().unwrap().starts_with("ORD-"));
        assert_eq!(created["orderStatus"], "PENDING");
        assert_eq!(created["total"], 600.0);

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = app
            .request("GET", &format!("/api/orders/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["user"]["name"], "Wanjiku");
        assert_eq!(fetched["items"][0]["quantity"], 2);
        assert_eq!(fetched["items"][0]["product"]["category"], "eggs");

        let (_, list) = app.request("GET", "/api/orders", Some(&token), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn status_update_without_email_still_succeeds() {
        let (app, token) = seeded().await;
        let (_, created) = app.request("POST", "/api/orders", Some(&token), Some(new_order())).await;
        let id = created["id"].as_str().unwrap();

        let (status, updated) = app
            .request(
                "PUT",
                &format!("/api/orders/{}", id),
                Some(&token),
                Some(json!({ "orderStatus": "PROCESSING", "paymentStatus": "PAID" })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["orderStatus"], "PROCESSING");
        assert_eq!(updated["paymentStatus"], "PAID");
        assert_eq!(updated["location"], "Kilimani");
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (app, token) = seeded().await;
        let (status, _) = app
            .request("PUT", "/api/orders/missing", Some(&token), Some(json!({ "location": "x" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn order_for_unknown_user_is_rejected() {
        let (app, token) = seeded().await;
        let mut body = new_order();
        body["userId"] = json!("ghost");
        let (status, _) = app.request("POST", "/api/orders", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
