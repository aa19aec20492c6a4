//! Supplement service: per-horse supplements, stock and deliveries

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    StockLevel, StockUnit, Subscription, Supplement, SupplementFrequency,
    DEFAULT_LOW_STOCK_THRESHOLD,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Supplement service for managing supplements and their stock
#[derive(Clone)]
pub struct SupplementService {
    db: PgPool,
}

/// Database row for a supplement
#[derive(Debug, sqlx::FromRow)]
struct SupplementRow {
    id: Uuid,
    user_id: String,
    horse_id: Uuid,
    horse_name: String,
    name: String,
    brand: Option<String>,
    dosage: String,
    frequency: String,
    current_stock: Decimal,
    stock_unit: String,
    low_stock_threshold: Decimal,
    notes: Option<String>,
    subscription: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SupplementRow> for Supplement {
    type Error = AppError;

    fn try_from(row: SupplementRow) -> Result<Self, Self::Error> {
        let frequency = SupplementFrequency::from_str(&row.frequency)
            .ok_or_else(|| AppError::Internal(format!("Unknown frequency {}", row.frequency)))?;
        let stock_unit = StockUnit::from_str(&row.stock_unit)
            .ok_or_else(|| AppError::Internal(format!("Unknown stock unit {}", row.stock_unit)))?;
        let subscription = row
            .subscription
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt subscription: {}", e)))?;

        Ok(Supplement {
            id: row.id,
            user_id: row.user_id,
            horse_id: row.horse_id,
            horse_name: row.horse_name,
            name: row.name,
            brand: row.brand,
            dosage: row.dosage,
            frequency,
            current_stock: row.current_stock,
            stock_unit,
            low_stock_threshold: row.low_stock_threshold,
            notes: row.notes,
            subscription,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SUPPLEMENT_COLUMNS: &str = "id, user_id, horse_id, horse_name, name, brand, dosage, \
     frequency, current_stock, stock_unit, low_stock_threshold, notes, subscription, \
     created_at, updated_at";

/// Supplement with its computed stock level
#[derive(Debug, Clone, Serialize)]
pub struct SupplementView {
    #[serde(flatten)]
    pub supplement: Supplement,
    pub stock_level: StockLevel,
}

impl From<Supplement> for SupplementView {
    fn from(supplement: Supplement) -> Self {
        let stock_level = supplement.stock_level();
        Self {
            supplement,
            stock_level,
        }
    }
}

/// Input for creating or replacing a supplement
#[derive(Debug, Deserialize, Validate)]
pub struct SupplementInput {
    pub horse_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Supplement name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Dosage is required"))]
    pub dosage: String,
    pub frequency: SupplementFrequency,
    pub current_stock: Decimal,
    pub stock_unit: StockUnit,
    pub low_stock_threshold: Option<Decimal>,
    pub notes: Option<String>,
    pub subscription: Option<Subscription>,
}

impl SupplementInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        shared::validate_stock_quantity(self.current_stock)
            .map_err(|m| AppError::invalid("current_stock", m))?;
        if let Some(threshold) = self.low_stock_threshold {
            shared::validate_stock_quantity(threshold)
                .map_err(|m| AppError::invalid("low_stock_threshold", m))?;
        }
        if let Some(sub) = &self.subscription {
            shared::validate_subscription(sub).map_err(|m| AppError::invalid("subscription", m))?;
        }
        Ok(())
    }
}

/// A received supplement delivery
#[derive(Debug, Deserialize)]
pub struct SupplementDeliveryInput {
    pub quantity: Decimal,
    /// Defaults to today
    pub delivered_on: Option<NaiveDate>,
}

impl SupplementService {
    /// Create a new SupplementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_supplement(
        &self,
        user_id: &str,
        input: SupplementInput,
    ) -> AppResult<Supplement> {
        input.check()?;
        let horse_name = self.horse_name(user_id, input.horse_id).await?;
        let subscription = subscription_json(&input.subscription)?;

        let row = sqlx::query_as::<_, SupplementRow>(&format!(
            r#"
            INSERT INTO supplements (
                user_id, horse_id, horse_name, name, brand, dosage, frequency,
                current_stock, stock_unit, low_stock_threshold, notes, subscription
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {SUPPLEMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.horse_id)
        .bind(&horse_name)
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(&input.dosage)
        .bind(input.frequency.as_str())
        .bind(input.current_stock)
        .bind(input.stock_unit.as_str())
        .bind(
            input
                .low_stock_threshold
                .unwrap_or_else(|| Decimal::from(DEFAULT_LOW_STOCK_THRESHOLD)),
        )
        .bind(&input.notes)
        .bind(subscription)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(supplement_id = %row.id, horse_id = %row.horse_id, "Supplement created");
        row.try_into()
    }

    pub async fn get_supplement(&self, user_id: &str, supplement_id: Uuid) -> AppResult<Supplement> {
        sqlx::query_as::<_, SupplementRow>(&format!(
            "SELECT {SUPPLEMENT_COLUMNS} FROM supplements WHERE id = $1 AND user_id = $2"
        ))
        .bind(supplement_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplement".to_string()))?
        .try_into()
    }

    /// List supplements grouped by horse, optionally for one horse only
    pub async fn list_supplements(
        &self,
        user_id: &str,
        horse_id: Option<Uuid>,
    ) -> AppResult<Vec<Supplement>> {
        let rows = sqlx::query_as::<_, SupplementRow>(&format!(
            r#"
            SELECT {SUPPLEMENT_COLUMNS} FROM supplements
            WHERE user_id = $1 AND ($2::uuid IS NULL OR horse_id = $2)
            ORDER BY horse_name, name
            "#
        ))
        .bind(user_id)
        .bind(horse_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Supplement::try_from).collect()
    }

    pub async fn update_supplement(
        &self,
        user_id: &str,
        supplement_id: Uuid,
        input: SupplementInput,
    ) -> AppResult<Supplement> {
        input.check()?;
        let horse_name = self.horse_name(user_id, input.horse_id).await?;
        let subscription = subscription_json(&input.subscription)?;

        sqlx::query_as::<_, SupplementRow>(&format!(
            r#"
            UPDATE supplements
            SET horse_id = $3, horse_name = $4, name = $5, brand = $6, dosage = $7,
                frequency = $8, current_stock = $9, stock_unit = $10,
                low_stock_threshold = COALESCE($11, low_stock_threshold), notes = $12,
                subscription = $13, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {SUPPLEMENT_COLUMNS}
            "#
        ))
        .bind(supplement_id)
        .bind(user_id)
        .bind(input.horse_id)
        .bind(&horse_name)
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(&input.dosage)
        .bind(input.frequency.as_str())
        .bind(input.current_stock)
        .bind(input.stock_unit.as_str())
        .bind(input.low_stock_threshold)
        .bind(&input.notes)
        .bind(subscription)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplement".to_string()))?
        .try_into()
    }

    pub async fn delete_supplement(&self, user_id: &str, supplement_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM supplements WHERE id = $1 AND user_id = $2")
            .bind(supplement_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplement".to_string()));
        }
        Ok(())
    }

    /// Add delivered stock and advance the subscription schedule
    pub async fn record_delivery(
        &self,
        user_id: &str,
        supplement_id: Uuid,
        input: SupplementDeliveryInput,
    ) -> AppResult<Supplement> {
        shared::validate_delivery_quantity(input.quantity)
            .map_err(|m| AppError::invalid("quantity", m))?;
        let today = input.delivered_on.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;
        let current = lock_supplement(&mut tx, user_id, supplement_id).await?;
        let updated = current.with_delivery(input.quantity, today);
        let subscription = subscription_json(&updated.subscription)?;

        let row = sqlx::query_as::<_, SupplementRow>(&format!(
            r#"
            UPDATE supplements
            SET current_stock = $2, subscription = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLEMENT_COLUMNS}
            "#
        ))
        .bind(supplement_id)
        .bind(updated.current_stock)
        .bind(subscription)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            supplement_id = %supplement_id,
            quantity = %input.quantity,
            stock = %row.current_stock,
            "Supplement delivery recorded"
        );
        row.try_into()
    }

    async fn horse_name(&self, user_id: &str, horse_id: Uuid) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM horses WHERE id = $1 AND user_id = $2")
            .bind(horse_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Horse".to_string()))
    }
}

async fn lock_supplement(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    supplement_id: Uuid,
) -> AppResult<Supplement> {
    sqlx::query_as::<_, SupplementRow>(&format!(
        "SELECT {SUPPLEMENT_COLUMNS} FROM supplements WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(supplement_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Supplement".to_string()))?
    .try_into()
}

fn subscription_json(sub: &Option<Subscription>) -> AppResult<Option<serde_json::Value>> {
    sub.as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.to_string()))
}
