//! HTTP handlers for current weather

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{GpsCoordinates, WeatherSnapshot};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::AppState;

/// Optional location; both or neither must be given
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl WeatherQuery {
    fn coordinates(&self, barn: GpsCoordinates) -> AppResult<GpsCoordinates> {
        let coords = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => GpsCoordinates::new(lat, lon),
            (None, None) => return Ok(barn),
            _ => {
                return Err(AppError::invalid(
                    "lat",
                    "Latitude and longitude must be given together",
                ))
            }
        };
        shared::validate_coordinates(&coords).map_err(|m| AppError::invalid("lat", m))?;
        Ok(coords)
    }
}

/// Current conditions at the given location or the barn
pub async fn get_current_weather(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherSnapshot>> {
    let location = query.coordinates(state.config.barn.coordinates())?;
    let snapshot = state.weather.get_current_weather(location).await?;
    Ok(Json(snapshot))
}
