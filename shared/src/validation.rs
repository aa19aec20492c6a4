//! Validation utilities for barn records
//!
//! Plain checks returning a static message; the backend maps failures to
//! a `Validation` error naming the offending field.

use rust_decimal::Decimal;

use crate::models::{BlanketPreferences, Subscription};
use crate::types::{DateRange, GpsCoordinates};

// ============================================================================
// Horse Validations
// ============================================================================

/// Validate horse name (1-100 characters after trimming)
pub fn validate_horse_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Horse name is required");
    }
    if name.chars().count() > 100 {
        return Err("Horse name must be at most 100 characters");
    }
    Ok(())
}

/// Validate horse age in years
pub fn validate_horse_age(age: f64) -> Result<(), &'static str> {
    if !age.is_finite() {
        return Err("Age must be a number");
    }
    if !(0.0..=60.0).contains(&age) {
        return Err("Age must be between 0 and 60 years");
    }
    Ok(())
}

/// Validate horse body weight in lbs
pub fn validate_horse_weight(weight: f64) -> Result<(), &'static str> {
    if !weight.is_finite() {
        return Err("Weight must be a number");
    }
    if weight <= 0.0 {
        return Err("Weight must be positive");
    }
    if weight > 3500.0 {
        return Err("Weight must be at most 3500 lbs");
    }
    Ok(())
}

/// Blanket temperature preferences must get colder as the blanket gets heavier
pub fn validate_blanket_preferences(prefs: &BlanketPreferences) -> Result<(), &'static str> {
    let temps = [prefs.light_below_f, prefs.medium_below_f, prefs.heavy_below_f];
    if temps.iter().flatten().any(|t| !t.is_finite()) {
        return Err("Blanket temperatures must be numbers");
    }
    let set: Vec<f64> = temps.into_iter().flatten().collect();
    if set.windows(2).any(|w| w[1] > w[0]) {
        return Err("Heavier blankets must have lower temperature thresholds");
    }
    Ok(())
}

// ============================================================================
// Task Validations
// ============================================================================

/// Validate task title (1-200 characters after trimming)
pub fn validate_task_title(title: &str) -> Result<(), &'static str> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Task title is required");
    }
    if title.chars().count() > 200 {
        return Err("Task title must be at most 200 characters");
    }
    Ok(())
}

/// Validate a 24-hour clock time
pub fn validate_scheduled_time(hour: u32, minute: u32) -> Result<(), &'static str> {
    if hour > 23 {
        return Err("Hour must be between 0 and 23");
    }
    if minute > 59 {
        return Err("Minute must be between 0 and 59");
    }
    Ok(())
}

pub fn validate_date_range(range: &DateRange) -> Result<(), &'static str> {
    if !range.is_ordered() {
        return Err("Start date must not be after end date");
    }
    Ok(())
}

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate a stock quantity or threshold (zero allowed)
pub fn validate_stock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a delivered quantity
pub fn validate_delivery_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Delivery quantity must be positive");
    }
    Ok(())
}

pub fn validate_subscription(subscription: &Subscription) -> Result<(), &'static str> {
    if subscription.delivery_frequency_days < 1 {
        return Err("Delivery frequency must be at least 1 day");
    }
    if subscription.delivery_frequency_days > 365 {
        return Err("Delivery frequency must be at most 365 days");
    }
    validate_delivery_quantity(subscription.quantity_per_delivery)
}

// ============================================================================
// Location Validations
// ============================================================================

pub fn validate_coordinates(coords: &GpsCoordinates) -> Result<(), &'static str> {
    if !coords.is_valid() {
        return Err("Coordinates must be within latitude -90..90 and longitude -180..180");
    }
    Ok(())
}

/// Validate a media URL supplied for a photo or audio recording
pub fn validate_media_url(url: &str) -> Result<(), &'static str> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err("Media URL must be http or https");
    }
    if url.len() > 2048 {
        return Err("Media URL is too long");
    }
    Ok(())
}
