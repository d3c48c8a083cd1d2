use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{ensure_admin, AuthUser},
    entities::shoe_inventory,
    errors::ServiceError,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryLevelResponse {
    pub shoe_model_id: Uuid,
    pub size: String,
    pub quantity_available: i32,
    pub quantity_reserved: i32,
    /// Sellable stock: available minus reserved, floored at zero.
    pub actual_available: i32,
    pub in_stock: bool,
}

impl From<&shoe_inventory::Model> for InventoryLevelResponse {
    fn from(model: &shoe_inventory::Model) -> Self {
        Self {
            shoe_model_id: model.shoe_model_id,
            size: model.size.clone(),
            quantity_available: model.quantity_available,
            quantity_reserved: model.quantity_reserved,
            actual_available: model.actual_available(),
            in_stock: model.is_sellable(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    pub shoe_model_id: Uuid,
    pub size: String,
    pub requested: i32,
    pub available: bool,
    pub actual_available: i32,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetInventoryLevelsRequest {
    #[validate(range(min = 0, message = "Available quantity must be non-negative"))]
    pub quantity_available: i32,

    #[serde(default)]
    #[validate(range(min = 0, message = "Reserved quantity must be non-negative"))]
    pub quantity_reserved: i32,
}

/// GET /api/v1/inventory/:model_id: all sizes for a model.
pub async fn list_model_inventory(
    State(state): State<AppState>,
    Path(shoe_model_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 for an unknown model rather than an empty list.
    state.services.catalog.get_model(shoe_model_id).await?;

    let records = state.services.inventory.list_for_model(shoe_model_id).await?;
    let levels: Vec<InventoryLevelResponse> =
        records.iter().map(InventoryLevelResponse::from).collect();
    Ok(Json(ApiResponse::success(levels)))
}

/// GET /api/v1/inventory/:model_id/:size?quantity=N: availability check.
pub async fn check_availability(
    State(state): State<AppState>,
    Path((shoe_model_id, size)): Path<(Uuid, String)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let available = state
        .services
        .inventory
        .is_available(shoe_model_id, &size, query.quantity)
        .await?;
    let actual_available = state
        .services
        .inventory
        .available_quantity(shoe_model_id, &size)
        .await?;

    Ok(Json(ApiResponse::success(AvailabilityResponse {
        shoe_model_id,
        size,
        requested: query.quantity,
        available,
        actual_available,
    })))
}

/// PUT /api/v1/inventory/:model_id/:size: admin provisioning.
pub async fn set_inventory_levels(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((shoe_model_id, size)): Path<(Uuid, String)>,
    Json(payload): Json<SetInventoryLevelsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    ensure_admin(&auth)?;
    payload.validate()?;

    // Provisioning against an unknown model is a client error.
    state.services.catalog.get_model(shoe_model_id).await?;

    let record = state
        .services
        .inventory
        .set_levels(
            shoe_model_id,
            &size,
            payload.quantity_available,
            payload.quantity_reserved,
        )
        .await?;
    Ok(Json(ApiResponse::success(InventoryLevelResponse::from(
        &record,
    ))))
}
