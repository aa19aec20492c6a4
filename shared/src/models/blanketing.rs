//! Blanketing recommendation engine
//!
//! Scores a horse's physical attributes and the current weather into a
//! blanket weight. Four independent factors are summed; the total (3-16)
//! decides both whether a blanket is needed and which weight.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{HairLength, HorseAttributes, WeatherSnapshot};
use crate::error::{DomainError, DomainResult};

/// Score above which a blanket is needed (medium or heavier)
pub const BLANKET_NEEDED_ABOVE: u8 = 7;
const HEAVY_ABOVE: u8 = 12;
const LIGHT_ABOVE: u8 = 5;

/// Blanket weight classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlanketWeight {
    None,
    Light,
    Medium,
    Heavy,
}

impl BlanketWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlanketWeight::None => "none",
            BlanketWeight::Light => "light",
            BlanketWeight::Medium => "medium",
            BlanketWeight::Heavy => "heavy",
        }
    }
}

impl FromStr for BlanketWeight {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(BlanketWeight::None),
            "light" => Ok(BlanketWeight::Light),
            "medium" => Ok(BlanketWeight::Medium),
            "heavy" => Ok(BlanketWeight::Heavy),
            other => Err(DomainError::out_of_range(
                "blanket_weight",
                format!("unknown blanket weight '{}'", other),
            )),
        }
    }
}

impl std::fmt::Display for BlanketWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-factor breakdown of a blanketing score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlanketingFactors {
    pub age: u8,
    pub weight: u8,
    pub coat: u8,
    pub weather: u8,
}

impl BlanketingFactors {
    pub fn total(&self) -> u8 {
        self.age + self.weight + self.coat + self.weather
    }
}

/// Output of the blanketing engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlanketingRecommendation {
    pub blanket_needed: bool,
    pub blanket_weight: BlanketWeight,
    pub score: u8,
    pub factors: BlanketingFactors,
}

/// Suggested change to what a horse is currently wearing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlanketAction {
    Add,
    Remove,
}

impl BlanketAction {
    /// Compare the current blanket against a recommendation.
    ///
    /// Only flips between blanketed and unblanketed are reported; swapping
    /// one weight for another is left to the caretaker.
    pub fn for_change(
        current: BlanketWeight,
        recommendation: &BlanketingRecommendation,
    ) -> Option<BlanketAction> {
        let wearing = current != BlanketWeight::None;
        match (wearing, recommendation.blanket_needed) {
            (false, true) => Some(BlanketAction::Add),
            (true, false) => Some(BlanketAction::Remove),
            _ => None,
        }
    }
}

/// Compute a blanketing recommendation for a horse under the given weather
pub fn calculate_blanketing(
    horse: &HorseAttributes,
    weather: &WeatherSnapshot,
) -> DomainResult<BlanketingRecommendation> {
    validate_attributes(horse)?;
    weather.validate()?;

    let factors = BlanketingFactors {
        age: age_factor(horse.age),
        weight: weight_factor(horse.weight),
        coat: coat_factor(horse.hair_length),
        weather: weather_factor(weather),
    };
    let score = factors.total();

    Ok(BlanketingRecommendation {
        blanket_needed: score > BLANKET_NEEDED_ABOVE,
        blanket_weight: determine_blanket_weight(score),
        score,
        factors,
    })
}

fn validate_attributes(horse: &HorseAttributes) -> DomainResult<()> {
    if !horse.age.is_finite() {
        return Err(DomainError::not_finite("age", horse.age));
    }
    if horse.age < 0.0 {
        return Err(DomainError::out_of_range("age", "age cannot be negative"));
    }
    if !horse.weight.is_finite() {
        return Err(DomainError::not_finite("weight", horse.weight));
    }
    if horse.weight <= 0.0 {
        return Err(DomainError::out_of_range("weight", "weight must be positive"));
    }
    Ok(())
}

/// Older horses hold heat less well
pub fn age_factor(age: f64) -> u8 {
    if age > 20.0 {
        3
    } else if age > 15.0 {
        2
    } else {
        1
    }
}

/// Lighter horses hold heat less well
pub fn weight_factor(weight: f64) -> u8 {
    if weight < 800.0 {
        3
    } else if weight < 1000.0 {
        2
    } else {
        1
    }
}

pub fn coat_factor(hair_length: HairLength) -> u8 {
    match hair_length {
        HairLength::Clipped => 4,
        HairLength::Short => 3,
        HairLength::Medium => 2,
        HairLength::Long => 1,
    }
}

/// Temperature band plus one point each for precipitation and wind over 15 mph
pub fn weather_factor(weather: &WeatherSnapshot) -> u8 {
    let mut factor = if weather.temperature_f < 32.0 {
        4
    } else if weather.temperature_f < 45.0 {
        3
    } else if weather.temperature_f < 60.0 {
        2
    } else {
        0
    };

    if weather.is_precipitating() {
        factor += 1;
    }
    if weather.wind_speed_mph > 15.0 {
        factor += 1;
    }

    factor
}

pub fn determine_blanket_weight(score: u8) -> BlanketWeight {
    if score > HEAVY_ABOVE {
        BlanketWeight::Heavy
    } else if score > BLANKET_NEEDED_ABOVE {
        BlanketWeight::Medium
    } else if score > LIGHT_ABOVE {
        BlanketWeight::Light
    } else {
        BlanketWeight::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(temp: f64, wind: f64, precip: f64) -> WeatherSnapshot {
        WeatherSnapshot::new(temp, "Clear", wind, precip)
    }

    #[test]
    fn test_old_light_clipped_horse_in_a_storm() {
        let horse = HorseAttributes::new(22.0, 700.0, HairLength::Clipped);
        let rec = calculate_blanketing(&horse, &weather(20.0, 20.0, 0.1)).unwrap();

        assert_eq!(
            rec.factors,
            BlanketingFactors {
                age: 3,
                weight: 3,
                coat: 4,
                weather: 6
            }
        );
        assert_eq!(rec.score, 16);
        assert_eq!(rec.blanket_weight, BlanketWeight::Heavy);
        assert!(rec.blanket_needed);
    }

    #[test]
    fn test_young_heavy_long_coat_on_a_warm_day() {
        let horse = HorseAttributes::new(10.0, 1200.0, HairLength::Long);
        let rec = calculate_blanketing(&horse, &weather(70.0, 5.0, 0.0)).unwrap();

        assert_eq!(rec.score, 3);
        assert_eq!(rec.blanket_weight, BlanketWeight::None);
        assert!(!rec.blanket_needed);
    }

    #[test]
    fn test_clipped_below_freezing_minimum_is_medium() {
        let horse = HorseAttributes::new(5.0, 1100.0, HairLength::Clipped);
        let rec = calculate_blanketing(&horse, &weather(31.0, 0.0, 0.0)).unwrap();

        assert_eq!(rec.score, 10);
        assert_eq!(rec.blanket_weight, BlanketWeight::Medium);
        assert!(rec.blanket_needed);
    }

    #[test]
    fn test_age_factor_boundaries() {
        assert_eq!(age_factor(15.0), 1);
        assert_eq!(age_factor(15.5), 2);
        assert_eq!(age_factor(20.0), 2);
        assert_eq!(age_factor(21.0), 3);
    }

    #[test]
    fn test_weight_factor_boundaries() {
        assert_eq!(weight_factor(799.0), 3);
        assert_eq!(weight_factor(800.0), 2);
        assert_eq!(weight_factor(999.9), 2);
        assert_eq!(weight_factor(1000.0), 1);
    }

    #[test]
    fn test_weather_factor_bands() {
        assert_eq!(weather_factor(&weather(31.9, 0.0, 0.0)), 4);
        assert_eq!(weather_factor(&weather(32.0, 0.0, 0.0)), 3);
        assert_eq!(weather_factor(&weather(45.0, 0.0, 0.0)), 2);
        assert_eq!(weather_factor(&weather(60.0, 0.0, 0.0)), 0);
        assert_eq!(weather_factor(&weather(60.0, 15.0, 0.0)), 0);
        assert_eq!(weather_factor(&weather(60.0, 15.1, 0.01)), 2);
    }

    #[test]
    fn test_weight_thresholds() {
        assert_eq!(determine_blanket_weight(4), BlanketWeight::None);
        assert_eq!(determine_blanket_weight(5), BlanketWeight::None);
        assert_eq!(determine_blanket_weight(6), BlanketWeight::Light);
        assert_eq!(determine_blanket_weight(7), BlanketWeight::Light);
        assert_eq!(determine_blanket_weight(8), BlanketWeight::Medium);
        assert_eq!(determine_blanket_weight(12), BlanketWeight::Medium);
        assert_eq!(determine_blanket_weight(13), BlanketWeight::Heavy);
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        let ok_weather = weather(40.0, 0.0, 0.0);
        let horse = HorseAttributes::new(f64::NAN, 900.0, HairLength::Short);
        assert!(matches!(
            calculate_blanketing(&horse, &ok_weather),
            Err(DomainError::InvalidInput { field: "age", .. })
        ));

        let horse = HorseAttributes::new(8.0, 900.0, HairLength::Short);
        assert!(matches!(
            calculate_blanketing(&horse, &weather(f64::NEG_INFINITY, 0.0, 0.0)),
            Err(DomainError::InvalidInput { field: "temperature", .. })
        ));
    }

    #[test]
    fn test_blanket_action() {
        let horse = HorseAttributes::new(22.0, 700.0, HairLength::Clipped);
        let cold = calculate_blanketing(&horse, &weather(20.0, 20.0, 0.1)).unwrap();
        assert_eq!(
            BlanketAction::for_change(BlanketWeight::None, &cold),
            Some(BlanketAction::Add)
        );
        assert_eq!(BlanketAction::for_change(BlanketWeight::Light, &cold), None);

        let horse = HorseAttributes::new(10.0, 1200.0, HairLength::Long);
        let warm = calculate_blanketing(&horse, &weather(70.0, 5.0, 0.0)).unwrap();
        assert_eq!(
            BlanketAction::for_change(BlanketWeight::Heavy, &warm),
            Some(BlanketAction::Remove)
        );
        assert_eq!(BlanketAction::for_change(BlanketWeight::None, &warm), None);
    }

    #[test]
    fn test_blanket_weight_round_trips_through_str() {
        for w in [
            BlanketWeight::None,
            BlanketWeight::Light,
            BlanketWeight::Medium,
            BlanketWeight::Heavy,
        ] {
            assert_eq!(w.as_str().parse::<BlanketWeight>(), Ok(w));
        }
        assert!("extra".parse::<BlanketWeight>().is_err());
    }
}
