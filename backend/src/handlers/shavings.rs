//! HTTP handlers for shavings inventory endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::ShavingsDelivery;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::shavings::{
    DeliveryInput, InventoryInput, OrderInput, ShavingsOverview, ShavingsService,
};
use crate::AppState;

/// Current inventory and reorder status
pub async fn get_shavings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ShavingsOverview>> {
    let service = ShavingsService::new(state.db);
    let inventory = service.get_inventory(&current_user.0.user_id).await?;
    Ok(Json(inventory.into()))
}

pub async fn update_shavings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<InventoryInput>,
) -> AppResult<Json<ShavingsOverview>> {
    let service = ShavingsService::new(state.db);
    let inventory = service
        .upsert_inventory(&current_user.0.user_id, input)
        .await?;
    Ok(Json(Some(inventory).into()))
}

pub async fn record_shavings_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DeliveryInput>,
) -> AppResult<(StatusCode, Json<ShavingsOverview>)> {
    let service = ShavingsService::new(state.db);
    let inventory = service
        .record_delivery(&current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(Some(inventory).into())))
}

#[derive(Debug, Deserialize)]
pub struct DeliveriesQuery {
    pub limit: Option<i64>,
}

pub async fn list_shavings_deliveries(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DeliveriesQuery>,
) -> AppResult<Json<Vec<ShavingsDelivery>>> {
    let service = ShavingsService::new(state.db);
    let deliveries = service
        .list_deliveries(&current_user.0.user_id, query.limit)
        .await?;
    Ok(Json(deliveries))
}

/// Mark that an order has been placed with the supplier
pub async fn place_shavings_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OrderInput>,
) -> AppResult<Json<ShavingsOverview>> {
    let service = ShavingsService::new(state.db);
    let inventory = service.place_order(&current_user.0.user_id, input).await?;
    Ok(Json(Some(inventory).into()))
}
