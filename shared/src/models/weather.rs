//! Weather data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

const MM_PER_INCH: f64 = 25.4;

/// A point-in-time weather observation, in imperial units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_f: f64,
    /// Categorical condition as reported by the provider, e.g. "Rain", "Clear"
    pub condition: String,
    pub wind_speed_mph: f64,
    pub precipitation_in_per_hr: f64,
    #[serde(default)]
    pub humidity_percent: Option<i32>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn new(
        temperature_f: f64,
        condition: impl Into<String>,
        wind_speed_mph: f64,
        precipitation_in_per_hr: f64,
    ) -> Self {
        Self {
            temperature_f,
            condition: condition.into(),
            wind_speed_mph,
            precipitation_in_per_hr,
            humidity_percent: None,
            observed_at: None,
        }
    }

    pub fn is_precipitating(&self) -> bool {
        self.precipitation_in_per_hr > 0.0
    }

    pub fn is_raining(&self) -> bool {
        self.condition.eq_ignore_ascii_case("rain")
    }

    /// Check every numeric field is a finite number within its domain
    pub fn validate(&self) -> DomainResult<()> {
        if !self.temperature_f.is_finite() {
            return Err(DomainError::not_finite("temperature", self.temperature_f));
        }
        if !self.wind_speed_mph.is_finite() {
            return Err(DomainError::not_finite("wind_speed", self.wind_speed_mph));
        }
        if self.wind_speed_mph < 0.0 {
            return Err(DomainError::out_of_range(
                "wind_speed",
                "wind speed cannot be negative",
            ));
        }
        if !self.precipitation_in_per_hr.is_finite() {
            return Err(DomainError::not_finite(
                "precipitation",
                self.precipitation_in_per_hr,
            ));
        }
        if self.precipitation_in_per_hr < 0.0 {
            return Err(DomainError::out_of_range(
                "precipitation",
                "precipitation cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Convert a millimetre rainfall reading to inches
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precipitation_flag() {
        assert!(WeatherSnapshot::new(40.0, "Rain", 5.0, 0.01).is_precipitating());
        assert!(!WeatherSnapshot::new(40.0, "Clear", 5.0, 0.0).is_precipitating());
    }

    #[test]
    fn test_rain_condition_is_case_insensitive() {
        assert!(WeatherSnapshot::new(40.0, "rain", 0.0, 0.0).is_raining());
        assert!(!WeatherSnapshot::new(40.0, "Drizzle", 0.0, 0.0).is_raining());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(WeatherSnapshot::new(f64::NAN, "Clear", 0.0, 0.0).validate().is_err());
        assert!(WeatherSnapshot::new(30.0, "Clear", f64::INFINITY, 0.0)
            .validate()
            .is_err());
        assert!(WeatherSnapshot::new(30.0, "Clear", 3.0, -0.1).validate().is_err());
        assert!(WeatherSnapshot::new(-10.0, "Snow", 3.0, 0.2).validate().is_ok());
    }

    #[test]
    fn test_mm_to_inches() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-9);
        assert!(mm_to_inches(0.1) > 0.0);
    }
}
