//! Horse models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DomainError;

/// A stabled horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub breed: Option<String>,
    /// Age in years
    pub age: Option<f64>,
    /// Body weight in lbs
    pub weight: Option<f64>,
    pub color: Option<String>,
    pub stall: Option<String>,
    pub notes: Option<String>,
    pub hair_length: Option<HairLength>,
    pub blanket_preferences: Option<BlanketPreferences>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Coat/hair length category, a proxy for natural insulation.
///
/// Deserializes through [`FromStr`], so JSON input rejects an unknown coat
/// with the same `InvalidCoatCategory` as any other entry point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HairLength {
    Clipped,
    Short,
    Medium,
    Long,
}

impl HairLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            HairLength::Clipped => "clipped",
            HairLength::Short => "short",
            HairLength::Medium => "medium",
            HairLength::Long => "long",
        }
    }
}

impl FromStr for HairLength {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clipped" => Ok(HairLength::Clipped),
            "short" => Ok(HairLength::Short),
            "medium" => Ok(HairLength::Medium),
            "long" => Ok(HairLength::Long),
            _ => Err(DomainError::InvalidCoatCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for HairLength {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for HairLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-horse blanketing temperature preferences (°F).
///
/// Stored with the horse for the caretaker's reference; the decision engine
/// scores on physical attributes only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BlanketPreferences {
    pub light_below_f: Option<f64>,
    pub medium_below_f: Option<f64>,
    pub heavy_below_f: Option<f64>,
}

/// The attributes of a horse the blanketing engine scores on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HorseAttributes {
    /// Age in years
    pub age: f64,
    /// Body weight in lbs
    pub weight: f64,
    pub hair_length: HairLength,
}

impl HorseAttributes {
    pub fn new(age: f64, weight: f64, hair_length: HairLength) -> Self {
        Self {
            age,
            weight,
            hair_length,
        }
    }
}

impl TryFrom<&Horse> for HorseAttributes {
    type Error = DomainError;

    fn try_from(horse: &Horse) -> Result<Self, Self::Error> {
        Ok(Self {
            age: horse.age.ok_or_else(|| DomainError::missing("age"))?,
            weight: horse.weight.ok_or_else(|| DomainError::missing("weight"))?,
            hair_length: horse
                .hair_length
                .ok_or_else(|| DomainError::missing("hair_length"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horse() -> Horse {
        Horse {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            name: "Biscuit".to_string(),
            breed: Some("Quarter Horse".to_string()),
            age: Some(12.0),
            weight: Some(1100.0),
            color: None,
            stall: Some("4".to_string()),
            notes: None,
            hair_length: Some(HairLength::Medium),
            blanket_preferences: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_hair_length_parsing() {
        assert_eq!("clipped".parse::<HairLength>(), Ok(HairLength::Clipped));
        assert_eq!(" Long ".parse::<HairLength>(), Ok(HairLength::Long));
        assert_eq!(
            "shaggy".parse::<HairLength>(),
            Err(DomainError::InvalidCoatCategory("shaggy".to_string()))
        );
    }

    #[test]
    fn test_hair_length_serde_uses_coat_category_error() {
        let err = serde_json::from_str::<HairLength>("\"woolly\"").unwrap_err();
        assert!(err.to_string().contains("Invalid coat category: woolly"));

        let parsed: HairLength = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(parsed, HairLength::Short);
        assert_eq!(serde_json::to_string(&HairLength::Clipped).unwrap(), "\"clipped\"");
    }

    #[test]
    fn test_attributes_json_rejects_unknown_coat() {
        let err = serde_json::from_str::<HorseAttributes>(
            r#"{"age": 5, "weight": 900, "hair_length": "shaggy"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid coat category: shaggy"));
    }

    #[test]
    fn test_attributes_from_complete_horse() {
        let attrs = HorseAttributes::try_from(&horse()).unwrap();
        assert_eq!(attrs, HorseAttributes::new(12.0, 1100.0, HairLength::Medium));
    }

    #[test]
    fn test_attributes_require_every_field() {
        let mut h = horse();
        h.weight = None;
        match HorseAttributes::try_from(&h) {
            Err(DomainError::InvalidInput { field, .. }) => assert_eq!(field, "weight"),
            other => panic!("unexpected result: {:?}", other),
        }

        let mut h = horse();
        h.hair_length = None;
        assert!(HorseAttributes::try_from(&h).is_err());
    }
}
