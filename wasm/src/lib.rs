//! WebAssembly module for the Barn Tracker
//!
//! Lets the mobile client work offline with the same decision logic the
//! server uses:
//! - Blanketing recommendations
//! - Task completion streaks
//! - Feed room stock levels

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn parse_date(date: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", date, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

/// Blanketing recommendation for a horse under the given weather.
///
/// Takes `HorseAttributes` and `WeatherSnapshot` JSON, returns
/// `BlanketingRecommendation` JSON.
#[wasm_bindgen]
pub fn recommend_blanket(horse_json: &str, weather_json: &str) -> Result<String, JsValue> {
    let horse: HorseAttributes = serde_json::from_str(horse_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid horse JSON: {}", e)))?;
    let weather: WeatherSnapshot = serde_json::from_str(weather_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid weather JSON: {}", e)))?;

    let recommendation =
        calculate_blanketing(&horse, &weather).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_json(&recommendation)
}

/// Blanket weight band for a raw score, e.g. "medium"
#[wasm_bindgen]
pub fn blanket_weight_for_score(score: u8) -> String {
    determine_blanket_weight(score).as_str().to_string()
}

/// Record a completion on `date` (YYYY-MM-DD) at `timestamp` (RFC 3339).
///
/// Returns the updated `TaskStreakState` JSON.
#[wasm_bindgen]
pub fn record_task_completion(
    state_json: &str,
    date: &str,
    timestamp: &str,
) -> Result<String, JsValue> {
    let state: TaskStreakState = serde_json::from_str(state_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid task state JSON: {}", e)))?;
    let at = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| JsValue::from_str(&format!("Invalid timestamp '{}': {}", timestamp, e)))?
        .with_timezone(&Utc);

    to_json(&state.record_completion(parse_date(date)?, at))
}

/// Undo the completion recorded on `date` (YYYY-MM-DD)
#[wasm_bindgen]
pub fn revert_task_completion(state_json: &str, date: &str) -> Result<String, JsValue> {
    let state: TaskStreakState = serde_json::from_str(state_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid task state JSON: {}", e)))?;
    to_json(&state.revert_completion(parse_date(date)?))
}

/// Stock level of a supplement: "out_of_stock", "low" or "in_stock"
#[wasm_bindgen]
pub fn supplement_stock_level(current_stock: f64, low_stock_threshold: f64) -> Result<String, JsValue> {
    let stock = Decimal::try_from(current_stock)
        .map_err(|e| JsValue::from_str(&format!("Invalid stock: {}", e)))?;
    let threshold = Decimal::try_from(low_stock_threshold)
        .map_err(|e| JsValue::from_str(&format!("Invalid threshold: {}", e)))?;

    let level = match stock_level(stock, threshold) {
        StockLevel::OutOfStock => "out_of_stock",
        StockLevel::Low => "low",
        StockLevel::InStock => "in_stock",
    };
    Ok(level.to_string())
}

/// Shavings status for `ShavingsInventory` JSON, or `null` when none is set up
#[wasm_bindgen]
pub fn shavings_status(inventory_json: &str) -> Result<String, JsValue> {
    let inventory: Option<ShavingsInventory> = serde_json::from_str(inventory_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid inventory JSON: {}", e)))?;
    Ok(ShavingsStatus::of(inventory.as_ref()).to_string())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn rejects_malformed_input() {
        let state = serde_json::to_string(&TaskStreakState::default()).unwrap();
        assert!(revert_task_completion(&state, "04/01/2024").is_err());
        assert!(recommend_blanket("{}", "{}").is_err());
        assert!(supplement_stock_level(f64::NAN, 5.0).is_err());
    }

    #[wasm_bindgen_test]
    fn unknown_coat_reports_coat_category() {
        let horse = r#"{"age": 5, "weight": 900, "hair_length": "shaggy"}"#;
        let weather = r#"{"temperature_f": 30, "condition": "Clear", "wind_speed_mph": 5, "precipitation_in_per_hr": 0}"#;

        let message = recommend_blanket(horse, weather)
            .unwrap_err()
            .as_string()
            .unwrap();
        assert!(message.contains("Invalid coat category: shaggy"));
    }
}
