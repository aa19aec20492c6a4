//! Blanketing recommendations for a user's horses under live weather

use serde::Serialize;
use shared::{
    calculate_blanketing, BlanketAction, BlanketWeight, BlanketingRecommendation,
    GpsCoordinates, Horse, HorseAttributes, WeatherSnapshot,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::WeatherClient;
use crate::services::HorseService;

/// Combines stored horses with current weather at the barn
#[derive(Clone)]
pub struct BlanketingService {
    horses: HorseService,
    weather_client: WeatherClient,
    barn: GpsCoordinates,
}

/// Recommendation for one horse
#[derive(Debug, Clone, Serialize)]
pub struct HorseBlanketing {
    pub horse_id: Uuid,
    pub horse_name: String,
    pub recommendation: BlanketingRecommendation,
    /// Present only when the current blanket was supplied and must change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<BlanketAction>,
}

/// A horse left out of the barn report
#[derive(Debug, Clone, Serialize)]
pub struct SkippedHorse {
    pub horse_id: Uuid,
    pub horse_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarnBlanketingReport {
    pub weather: WeatherSnapshot,
    pub horses: Vec<HorseBlanketing>,
    pub skipped: Vec<SkippedHorse>,
}

impl BlanketingService {
    pub fn new(horses: HorseService, weather_client: WeatherClient, barn: GpsCoordinates) -> Self {
        Self {
            horses,
            weather_client,
            barn,
        }
    }

    /// Recommendations for every horse at the barn.
    ///
    /// Horses missing age, weight or coat are reported as skipped rather than
    /// failing the whole report.
    pub async fn barn_report(&self, user_id: &str) -> AppResult<BarnBlanketingReport> {
        let horses = self.horses.list_horses(user_id).await?;
        let weather = self.weather_client.get_current_weather(self.barn).await?;

        let mut report = BarnBlanketingReport {
            weather,
            horses: Vec::with_capacity(horses.len()),
            skipped: Vec::new(),
        };

        for horse in horses {
            match recommend(&horse, &report.weather, None) {
                Ok(entry) => report.horses.push(entry),
                Err(e) => {
                    tracing::debug!(horse_id = %horse.id, "Skipping horse: {}", e);
                    report.skipped.push(SkippedHorse {
                        horse_id: horse.id,
                        horse_name: horse.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            horses = report.horses.len(),
            skipped = report.skipped.len(),
            temperature_f = report.weather.temperature_f,
            "Barn blanketing report computed"
        );
        Ok(report)
    }

    /// Recommendation for a single horse, with change advice when the
    /// blanket it is wearing now is known
    pub async fn for_horse(
        &self,
        user_id: &str,
        horse_id: Uuid,
        current: Option<BlanketWeight>,
    ) -> AppResult<HorseBlanketing> {
        let horse = self.horses.get_horse(user_id, horse_id).await?;
        let weather = self.weather_client.get_current_weather(self.barn).await?;
        Ok(recommend(&horse, &weather, current)?)
    }
}

/// Score one horse; fails when its attributes are incomplete or invalid
pub fn recommend(
    horse: &Horse,
    weather: &WeatherSnapshot,
    current: Option<BlanketWeight>,
) -> shared::DomainResult<HorseBlanketing> {
    let attributes = HorseAttributes::try_from(horse)?;
    let recommendation = calculate_blanketing(&attributes, weather)?;
    Ok(HorseBlanketing {
        horse_id: horse.id,
        horse_name: horse.name.clone(),
        action: current.and_then(|c| BlanketAction::for_change(c, &recommendation)),
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{DomainError, HairLength};

    fn horse(age: Option<f64>, hair_length: Option<HairLength>) -> Horse {
        Horse {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            name: "Juniper".to_string(),
            breed: None,
            age,
            weight: Some(700.0),
            color: None,
            stall: None,
            notes: None,
            hair_length,
            blanket_preferences: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cold_wet() -> WeatherSnapshot {
        WeatherSnapshot::new(20.0, "Snow", 20.0, 0.1)
    }

    #[test]
    fn test_recommend_with_change_advice() {
        let h = horse(Some(22.0), Some(HairLength::Clipped));
        let result = recommend(&h, &cold_wet(), Some(BlanketWeight::None)).unwrap();
        assert_eq!(result.recommendation.score, 16);
        assert_eq!(result.recommendation.blanket_weight, BlanketWeight::Heavy);
        assert_eq!(result.action, Some(BlanketAction::Add));

        let unchanged = recommend(&h, &cold_wet(), Some(BlanketWeight::Heavy)).unwrap();
        assert_eq!(unchanged.action, None);
    }

    #[test]
    fn test_recommend_missing_attribute() {
        let h = horse(Some(5.0), None);
        let err = recommend(&h, &cold_wet(), None).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidInput {
                field: "hair_length",
                ..
            }
        ));
    }
}
