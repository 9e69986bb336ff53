//! Order routes: menu listing/administration and diner orders.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::error::ServiceError;
use crate::domain::order::{MenuItem, Order, OrderItem};
use crate::domain::user::{AuthUser, UserId};

/// Routes nested under `/api/order`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", get(menu).put(add_menu_item))
        .route("/", get(diner_orders).post(create_order))
}

#[derive(Debug, Deserialize)]
struct MenuItemRequest {
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    franchise_id: Option<u64>,
    store_id: Option<u64>,
    #[serde(default)]
    items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrdersResponse {
    diner_id: UserId,
    orders: Vec<Order>,
    page: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOrderResponse {
    order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_url: Option<String>,
    jwt: String,
}

async fn menu(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>, ServiceError> {
    Ok(Json(state.orders.menu().await?))
}

async fn add_menu_item(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<MenuItemRequest>,
) -> Result<Json<Vec<MenuItem>>, ServiceError> {
    let menu = state
        .orders
        .add_menu_item(
            &caller,
            request.title.unwrap_or_default(),
            request.description.unwrap_or_default(),
            request.image.unwrap_or_default(),
            request.price.unwrap_or_default(),
        )
        .await?;
    Ok(Json(menu))
}

async fn diner_orders(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrdersResponse>, ServiceError> {
    let orders = state.orders.diner_orders(&caller, query.page).await?;
    Ok(Json(OrdersResponse {
        diner_id: caller.id,
        orders,
        page: query.page,
    }))
}

async fn create_order(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<PlacedOrderResponse>, ServiceError> {
    let (Some(franchise_id), Some(store_id)) = (request.franchise_id, request.store_id) else {
        return Err(ServiceError::BadRequest(
            "franchiseId and storeId are required".to_string(),
        ));
    };

    let placed = state
        .orders
        .place_order(&caller, franchise_id, store_id, request.items)
        .await?;
    Ok(Json(PlacedOrderResponse {
        order: placed.order,
        report_url: placed.report_url,
        jwt: placed.jwt,
    }))
}
