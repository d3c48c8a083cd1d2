use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{ensure_admin, ensure_owner_or_admin, AuthUser},
    entities::{order, order_item, order::OrderStatus},
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderStatistics, PlacedOrder},
    ApiResponse, AppState, ListQuery,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub shoe_model_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

fn map_item(model: &order_item::Model) -> OrderItemResponse {
    OrderItemResponse {
        id: model.id,
        shoe_model_id: model.shoe_model_id,
        size: model.size.clone(),
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
    }
}

fn map_order(model: &order::Model, items: &[order_item::Model]) -> Result<OrderResponse, ServiceError> {
    let status = model.status().ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Order {} has unrecognized status '{}'",
            model.id, model.status
        ))
    })?;

    Ok(OrderResponse {
        id: model.id,
        order_number: model.order_number.clone(),
        user_id: model.user_id,
        status,
        total_amount: model.total_amount,
        shipping_address_id: model.shipping_address_id,
        order_date: model.order_date,
        shipped_date: model.shipped_date,
        delivered_date: model.delivered_date,
        items: items.iter().map(map_item).collect(),
    })
}

fn map_placed(placed: &PlacedOrder) -> Result<OrderResponse, ServiceError> {
    map_order(&placed.order, &placed.items)
}

fn parse_status(value: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::parse(value)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Unknown order status: {}", value)))
}

/// POST /api/v1/orders: checkout for the authenticated user.
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state.services.orders.create_order(auth.user_id, payload).await?;
    let body = map_placed(&placed)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

/// GET /api/v1/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state.services.orders.get_order_with_items(order_id).await?;
    ensure_owner_or_admin(&auth, placed.order.user_id)?;
    Ok(Json(ApiResponse::success(map_placed(&placed)?)))
}

/// GET /api/v1/orders: the authenticated user's orders, newest first.
pub async fn list_my_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (orders, total) = state
        .services
        .orders
        .list_user_orders(auth.user_id, query.page, query.per_page)
        .await?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in &orders {
        // List rows omit line items; the detail endpoint loads them.
        responses.push(map_order(order, &[])?);
    }

    Ok(Json(ApiResponse::success(OrderListResponse {
        orders: responses,
        total,
        page: query.page,
        per_page: query.per_page,
    })))
}

/// POST /api/v1/orders/:id/status: drive the order state machine.
///
/// Cancellation is open to the order's owner; every other transition is an
/// operations (admin) action.
pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let new_status = parse_status(&payload.status)?;

    let order = state.services.orders.get_order(order_id).await?;
    let placed = if new_status == OrderStatus::Cancelled {
        ensure_owner_or_admin(&auth, order.user_id)?;
        state.services.orders.cancel_order(order_id).await?
    } else {
        ensure_admin(&auth)?;
        state
            .services
            .orders
            .update_order_status(order_id, new_status)
            .await?
    };
    Ok(Json(ApiResponse::success(map_placed(&placed)?)))
}

/// GET /api/v1/orders/statistics: admin dashboard numbers.
pub async fn order_statistics(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<OrderStatistics>>, ServiceError> {
    ensure_admin(&auth)?;
    let stats = state.services.orders.order_statistics().await?;
    Ok(Json(ApiResponse::success(stats)))
}
