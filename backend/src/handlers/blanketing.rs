//! HTTP handlers for blanketing recommendations

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::BlanketWeight;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::blanketing::{BarnBlanketingReport, BlanketingService, HorseBlanketing};
use crate::services::HorseService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HorseBlanketingQuery {
    /// Blanket the horse is wearing now, e.g. `?current=light`
    pub current: Option<String>,
}

fn service(state: &AppState) -> BlanketingService {
    BlanketingService::new(
        HorseService::new(state.db.clone()),
        state.weather.clone(),
        state.config.barn.coordinates(),
    )
}

/// Recommendations for every horse at the barn
pub async fn get_barn_blanketing(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<BarnBlanketingReport>> {
    let report = service(&state).barn_report(&current_user.0.user_id).await?;
    Ok(Json(report))
}

/// Recommendation for one horse
pub async fn get_horse_blanketing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(horse_id): Path<Uuid>,
    Query(query): Query<HorseBlanketingQuery>,
) -> AppResult<Json<HorseBlanketing>> {
    let current = query
        .current
        .as_deref()
        .map(str::parse::<BlanketWeight>)
        .transpose()?;

    let result = service(&state)
        .for_horse(&current_user.0.user_id, horse_id, current)
        .await?;
    Ok(Json(result))
}
