//! HTTP handlers for supplement endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::supplement::{
    SupplementDeliveryInput, SupplementInput, SupplementService, SupplementView,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SupplementQuery {
    pub horse_id: Option<Uuid>,
}

pub async fn create_supplement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SupplementInput>,
) -> AppResult<(StatusCode, Json<SupplementView>)> {
    let service = SupplementService::new(state.db);
    let supplement = service
        .create_supplement(&current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(supplement.into())))
}

/// List supplements with their stock level, optionally for one horse
pub async fn list_supplements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SupplementQuery>,
) -> AppResult<Json<Vec<SupplementView>>> {
    let service = SupplementService::new(state.db);
    let supplements = service
        .list_supplements(&current_user.0.user_id, query.horse_id)
        .await?;
    Ok(Json(supplements.into_iter().map(Into::into).collect()))
}

pub async fn get_supplement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplement_id): Path<Uuid>,
) -> AppResult<Json<SupplementView>> {
    let service = SupplementService::new(state.db);
    let supplement = service
        .get_supplement(&current_user.0.user_id, supplement_id)
        .await?;
    Ok(Json(supplement.into()))
}

pub async fn update_supplement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplement_id): Path<Uuid>,
    Json(input): Json<SupplementInput>,
) -> AppResult<Json<SupplementView>> {
    let service = SupplementService::new(state.db);
    let supplement = service
        .update_supplement(&current_user.0.user_id, supplement_id, input)
        .await?;
    Ok(Json(supplement.into()))
}

pub async fn delete_supplement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplement_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = SupplementService::new(state.db);
    service
        .delete_supplement(&current_user.0.user_id, supplement_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a delivery against a supplement's stock
pub async fn record_supplement_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supplement_id): Path<Uuid>,
    Json(input): Json<SupplementDeliveryInput>,
) -> AppResult<Json<SupplementView>> {
    let service = SupplementService::new(state.db);
    let supplement = service
        .record_delivery(&current_user.0.user_id, supplement_id, input)
        .await?;
    Ok(Json(supplement.into()))
}
