//! Weather tests
//!
//! Tests for weather observations including:
//! - rain detection and precipitation
//! - observation validation
//! - barn coordinates

use proptest::prelude::*;
use shared::{mm_to_inches, DomainError, GpsCoordinates, WeatherSnapshot};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_rain_is_condition_based() {
        assert!(WeatherSnapshot::new(45.0, "Rain", 3.0, 0.1).is_raining());
        assert!(WeatherSnapshot::new(45.0, "RAIN", 3.0, 0.0).is_raining());
        // Drizzle precipitates but is not reported as rain
        let drizzle = WeatherSnapshot::new(45.0, "Drizzle", 3.0, 0.02);
        assert!(drizzle.is_precipitating());
        assert!(!drizzle.is_raining());
    }

    #[test]
    fn test_snapshot_validation() {
        assert!(WeatherSnapshot::new(-10.0, "Snow", 12.0, 0.3).validate().is_ok());

        let err = WeatherSnapshot::new(f64::NAN, "Clear", 0.0, 0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput { field: "temperature", .. }));

        assert!(WeatherSnapshot::new(40.0, "Clear", -1.0, 0.0).validate().is_err());
        assert!(WeatherSnapshot::new(40.0, "Clear", 0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let parsed: WeatherSnapshot = serde_json::from_str(
            r#"{"temperature_f": 28.5, "condition": "Clouds", "wind_speed_mph": 9.0, "precipitation_in_per_hr": 0.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.humidity_percent, None);
        assert_eq!(parsed.observed_at, None);
        assert_eq!(parsed, WeatherSnapshot::new(28.5, "Clouds", 9.0, 0.0));
    }

    #[test]
    fn test_mm_to_inches() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-9);
        assert_eq!(mm_to_inches(0.0), 0.0);
    }

    #[test]
    fn test_barn_coordinates() {
        assert!(GpsCoordinates::new(38.0406, -84.5037).is_valid());
        assert!(GpsCoordinates::new(-90.0, 180.0).is_valid());
        assert!(!GpsCoordinates::new(0.0, -180.5).is_valid());
        assert!(!GpsCoordinates::new(f64::INFINITY, 0.0).is_valid());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Finite, non-negative readings always validate
        #[test]
        fn prop_finite_readings_validate(
            temp in -60.0f64..130.0,
            wind in 0.0f64..150.0,
            precip in 0.0f64..10.0,
        ) {
            prop_assert!(WeatherSnapshot::new(temp, "Clear", wind, precip).validate().is_ok());
        }

        /// Conversion preserves ordering
        #[test]
        fn prop_mm_to_inches_monotonic(a in 0.0f64..500.0, b in 0.0f64..500.0) {
            if a <= b {
                prop_assert!(mm_to_inches(a) <= mm_to_inches(b));
            }
        }
    }
}
