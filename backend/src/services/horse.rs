//! Horse management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{BlanketPreferences, HairLength, Horse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Horse service for managing a user's horses
#[derive(Clone)]
pub struct HorseService {
    db: PgPool,
}

/// Database row for a horse
#[derive(Debug, sqlx::FromRow)]
struct HorseRow {
    id: Uuid,
    user_id: String,
    name: String,
    breed: Option<String>,
    age: Option<f64>,
    weight: Option<f64>,
    color: Option<String>,
    stall: Option<String>,
    notes: Option<String>,
    hair_length: Option<String>,
    blanket_preferences: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HorseRow> for Horse {
    type Error = AppError;

    fn try_from(row: HorseRow) -> Result<Self, Self::Error> {
        let hair_length = row
            .hair_length
            .as_deref()
            .map(str::parse::<HairLength>)
            .transpose()?;
        let blanket_preferences = row
            .blanket_preferences
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt blanket preferences: {}", e)))?;

        Ok(Horse {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            breed: row.breed,
            age: row.age,
            weight: row.weight,
            color: row.color,
            stall: row.stall,
            notes: row.notes,
            hair_length,
            blanket_preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const HORSE_COLUMNS: &str = "id, user_id, name, breed, age, weight, color, stall, notes, \
     hair_length, blanket_preferences, created_at, updated_at";

/// Input for creating or replacing a horse
#[derive(Debug, Deserialize, Validate)]
pub struct HorseInput {
    #[validate(length(min = 1, max = 100, message = "Horse name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub breed: Option<String>,
    pub age: Option<f64>,
    pub weight: Option<f64>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub stall: Option<String>,
    pub notes: Option<String>,
    /// Parsed with `HairLength::from_str` so an unknown coat is a domain error
    pub hair_length: Option<String>,
    pub blanket_preferences: Option<BlanketPreferences>,
}

impl HorseInput {
    /// Validate the input, returning the parsed coat category
    fn check(&self) -> AppResult<Option<HairLength>> {
        self.validate()?;
        shared::validate_horse_name(&self.name).map_err(|m| AppError::invalid("name", m))?;
        if let Some(age) = self.age {
            shared::validate_horse_age(age).map_err(|m| AppError::invalid("age", m))?;
        }
        if let Some(weight) = self.weight {
            shared::validate_horse_weight(weight).map_err(|m| AppError::invalid("weight", m))?;
        }
        if let Some(prefs) = &self.blanket_preferences {
            shared::validate_blanket_preferences(prefs)
                .map_err(|m| AppError::invalid("blanket_preferences", m))?;
        }
        let coat = self
            .hair_length
            .as_deref()
            .map(str::parse::<HairLength>)
            .transpose()?;
        Ok(coat)
    }

    fn preferences_json(&self) -> AppResult<Option<serde_json::Value>> {
        self.blanket_preferences
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

impl HorseService {
    /// Create a new HorseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a horse
    pub async fn create_horse(&self, user_id: &str, input: HorseInput) -> AppResult<Horse> {
        let coat = input.check()?;
        let prefs = input.preferences_json()?;

        let row = sqlx::query_as::<_, HorseRow>(&format!(
            r#"
            INSERT INTO horses (
                user_id, name, breed, age, weight, color, stall, notes,
                hair_length, blanket_preferences
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {HORSE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.name.trim())
        .bind(&input.breed)
        .bind(input.age)
        .bind(input.weight)
        .bind(&input.color)
        .bind(&input.stall)
        .bind(&input.notes)
        .bind(coat.map(|h| h.as_str()))
        .bind(prefs)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(horse_id = %row.id, "Horse created");
        row.try_into()
    }

    /// Get a horse by ID
    pub async fn get_horse(&self, user_id: &str, horse_id: Uuid) -> AppResult<Horse> {
        sqlx::query_as::<_, HorseRow>(&format!(
            "SELECT {HORSE_COLUMNS} FROM horses WHERE id = $1 AND user_id = $2"
        ))
        .bind(horse_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Horse".to_string()))?
        .try_into()
    }

    /// List the user's horses by name
    pub async fn list_horses(&self, user_id: &str) -> AppResult<Vec<Horse>> {
        let rows = sqlx::query_as::<_, HorseRow>(&format!(
            "SELECT {HORSE_COLUMNS} FROM horses WHERE user_id = $1 ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Horse::try_from).collect()
    }

    /// Replace a horse's details
    pub async fn update_horse(
        &self,
        user_id: &str,
        horse_id: Uuid,
        input: HorseInput,
    ) -> AppResult<Horse> {
        let coat = input.check()?;
        let prefs = input.preferences_json()?;

        let row = sqlx::query_as::<_, HorseRow>(&format!(
            r#"
            UPDATE horses
            SET name = $3, breed = $4, age = $5, weight = $6, color = $7, stall = $8,
                notes = $9, hair_length = $10, blanket_preferences = $11, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {HORSE_COLUMNS}
            "#
        ))
        .bind(horse_id)
        .bind(user_id)
        .bind(input.name.trim())
        .bind(&input.breed)
        .bind(input.age)
        .bind(input.weight)
        .bind(&input.color)
        .bind(&input.stall)
        .bind(&input.notes)
        .bind(coat.map(|h| h.as_str()))
        .bind(prefs)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Horse".to_string()))?;

        // Keep the denormalised name on supplements in step
        sqlx::query("UPDATE supplements SET horse_name = $1 WHERE horse_id = $2")
            .bind(&row.name)
            .bind(horse_id)
            .execute(&self.db)
            .await?;

        row.try_into()
    }

    /// Delete a horse and its supplements
    pub async fn delete_horse(&self, user_id: &str, horse_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM horses WHERE id = $1 AND user_id = $2")
            .bind(horse_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Horse".to_string()));
        }
        tracing::info!(horse_id = %horse_id, "Horse deleted");
        Ok(())
    }
}
