//! Shoe store backend library.
//!
//! The core of the service is order placement and inventory reservation:
//! an inventory ledger with reserve/release/commit/restore operations, an
//! order item builder with all-or-nothing reservation semantics, and the
//! order status state machine that keeps the ledger consistent with each
//! order's lifecycle.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{response::Json as ResponseJson, routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// Standard response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

async fn health() -> ResponseJson<Value> {
    ResponseJson(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Assembles the HTTP router over the application state.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_my_orders),
        )
        .route(
            "/api/v1/orders/statistics",
            get(handlers::orders::order_statistics),
        )
        .route("/api/v1/orders/:id", get(handlers::orders::get_order))
        .route(
            "/api/v1/orders/:id/status",
            post(handlers::orders::update_order_status),
        )
        .route(
            "/api/v1/inventory/:model_id",
            get(handlers::inventory::list_model_inventory),
        )
        .route(
            "/api/v1/inventory/:model_id/:size",
            get(handlers::inventory::check_availability)
                .put(handlers::inventory::set_inventory_levels),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
