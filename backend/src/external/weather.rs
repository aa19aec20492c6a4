//! Weather API client for fetching current conditions
//!
//! Integrates with the OpenWeatherMap current weather API in imperial units

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{mm_to_inches, GpsCoordinates, WeatherSnapshot};

use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    wind: OWMWind,
    rain: Option<OWMRain>,
    snow: Option<OWMRain>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

/// Rain or snow volume in mm, regardless of the `units` parameter
#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient against the configured endpoint
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Fetch current weather conditions by GPS coordinates
    pub async fn get_current_weather(&self, location: GpsCoordinates) -> AppResult<WeatherSnapshot> {
        let url = format!("{}/weather", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "imperial".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Weather API request failed: {}", e);
                AppError::WeatherServiceUnavailable
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API error: {} - {}", status, body);
            return Err(AppError::WeatherServiceUnavailable);
        }

        let data: OWMCurrentResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse weather response: {}", e))
        })?;

        Ok(convert_current_response(data))
    }
}

/// Convert OpenWeatherMap current response to a snapshot
fn convert_current_response(data: OWMCurrentResponse) -> WeatherSnapshot {
    let precipitation_mm = [data.rain.as_ref(), data.snow.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(|r| r.one_hour)
        .sum::<f64>();

    WeatherSnapshot {
        temperature_f: data.main.temp,
        condition: data
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        wind_speed_mph: data.wind.speed,
        precipitation_in_per_hr: mm_to_inches(precipitation_mm),
        humidity_percent: data.main.humidity,
        observed_at: Some(DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_rainy_response() {
        let data: OWMCurrentResponse = serde_json::from_str(
            r#"{
                "weather": [{"main": "Rain", "description": "light rain"}],
                "main": {"temp": 41.5, "humidity": 88},
                "wind": {"speed": 17.2},
                "rain": {"1h": 2.54},
                "dt": 1704067200
            }"#,
        )
        .unwrap();

        let snapshot = convert_current_response(data);
        assert_eq!(snapshot.condition, "Rain");
        assert!((snapshot.precipitation_in_per_hr - 0.1).abs() < 1e-9);
        assert!(snapshot.is_precipitating());
        assert_eq!(snapshot.humidity_percent, Some(88));
        assert_eq!(snapshot.wind_speed_mph, 17.2);
    }

    #[test]
    fn test_convert_dry_response() {
        let data: OWMCurrentResponse = serde_json::from_str(
            r#"{
                "weather": [],
                "main": {"temp": 72.0},
                "wind": {"speed": 3.0},
                "dt": 1704067200
            }"#,
        )
        .unwrap();

        let snapshot = convert_current_response(data);
        assert_eq!(snapshot.condition, "Unknown");
        assert_eq!(snapshot.precipitation_in_per_hr, 0.0);
        assert!(!snapshot.is_precipitating());
    }
}
