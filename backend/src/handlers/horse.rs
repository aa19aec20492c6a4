//! HTTP handlers for horse management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::Horse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::horse::{HorseInput, HorseService};
use crate::AppState;

/// Create a horse
pub async fn create_horse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<HorseInput>,
) -> AppResult<(StatusCode, Json<Horse>)> {
    let service = HorseService::new(state.db);
    let horse = service.create_horse(&current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(horse)))
}

/// List the caller's horses
pub async fn list_horses(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Horse>>> {
    let service = HorseService::new(state.db);
    let horses = service.list_horses(&current_user.0.user_id).await?;
    Ok(Json(horses))
}

pub async fn get_horse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(horse_id): Path<Uuid>,
) -> AppResult<Json<Horse>> {
    let service = HorseService::new(state.db);
    let horse = service.get_horse(&current_user.0.user_id, horse_id).await?;
    Ok(Json(horse))
}

pub async fn update_horse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(horse_id): Path<Uuid>,
    Json(input): Json<HorseInput>,
) -> AppResult<Json<Horse>> {
    let service = HorseService::new(state.db);
    let horse = service
        .update_horse(&current_user.0.user_id, horse_id, input)
        .await?;
    Ok(Json(horse))
}

pub async fn delete_horse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(horse_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = HorseService::new(state.db);
    service.delete_horse(&current_user.0.user_id, horse_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
