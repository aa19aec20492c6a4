//! Shavings (bedding) inventory service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{ShavingsDelivery, ShavingsInventory, ShavingsStatus};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Default number of deliveries returned by the history endpoint
pub const DEFAULT_DELIVERY_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct ShavingsService {
    db: PgPool,
}

/// Database row for the per-user inventory
#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    user_id: String,
    current_bags: Decimal,
    reorder_threshold: Decimal,
    bags_per_order: Option<Decimal>,
    supplier: Option<String>,
    cost_per_bag: Option<Decimal>,
    pending_order_date: Option<NaiveDate>,
    expected_delivery_date: Option<NaiveDate>,
    last_updated: DateTime<Utc>,
}

impl From<InventoryRow> for ShavingsInventory {
    fn from(row: InventoryRow) -> Self {
        ShavingsInventory {
            user_id: row.user_id,
            current_bags: row.current_bags,
            reorder_threshold: row.reorder_threshold,
            bags_per_order: row.bags_per_order,
            supplier: row.supplier,
            cost_per_bag: row.cost_per_bag,
            pending_order_date: row.pending_order_date,
            expected_delivery_date: row.expected_delivery_date,
            last_updated: row.last_updated,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    bags_received: Decimal,
    delivered_at: NaiveDate,
    supplier: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<DeliveryRow> for ShavingsDelivery {
    fn from(row: DeliveryRow) -> Self {
        ShavingsDelivery {
            id: row.id,
            bags_received: row.bags_received,
            delivered_at: row.delivered_at,
            supplier: row.supplier,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const INVENTORY_COLUMNS: &str = "user_id, current_bags, reorder_threshold, bags_per_order, \
     supplier, cost_per_bag, pending_order_date, expected_delivery_date, last_updated";

/// Inventory (if configured) together with its status
#[derive(Debug, Clone, Serialize)]
pub struct ShavingsOverview {
    pub inventory: Option<ShavingsInventory>,
    pub status: ShavingsStatus,
    pub order_cost: Option<Decimal>,
}

impl From<Option<ShavingsInventory>> for ShavingsOverview {
    fn from(inventory: Option<ShavingsInventory>) -> Self {
        Self {
            status: ShavingsStatus::of(inventory.as_ref()),
            order_cost: inventory.as_ref().and_then(ShavingsInventory::order_cost),
            inventory,
        }
    }
}

/// Input for setting up or changing the inventory
#[derive(Debug, Deserialize, Validate)]
pub struct InventoryInput {
    pub current_bags: Decimal,
    pub reorder_threshold: Option<Decimal>,
    pub bags_per_order: Option<Decimal>,
    #[validate(length(max = 100))]
    pub supplier: Option<String>,
    pub cost_per_bag: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeliveryInput {
    pub bags_received: Decimal,
    pub delivered_at: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub expected_delivery_date: Option<NaiveDate>,
}

impl ShavingsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The user's inventory; `None` until it is first set up
    pub async fn get_inventory(&self, user_id: &str) -> AppResult<Option<ShavingsInventory>> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM shavings_inventory WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create or update the inventory settings and bag count
    pub async fn upsert_inventory(
        &self,
        user_id: &str,
        input: InventoryInput,
    ) -> AppResult<ShavingsInventory> {
        input.validate()?;
        shared::validate_stock_quantity(input.current_bags)
            .map_err(|m| AppError::invalid("current_bags", m))?;
        if let Some(threshold) = input.reorder_threshold {
            shared::validate_stock_quantity(threshold)
                .map_err(|m| AppError::invalid("reorder_threshold", m))?;
        }
        if let Some(bags) = input.bags_per_order {
            shared::validate_delivery_quantity(bags)
                .map_err(|m| AppError::invalid("bags_per_order", m))?;
        }
        if let Some(cost) = input.cost_per_bag {
            shared::validate_stock_quantity(cost)
                .map_err(|m| AppError::invalid("cost_per_bag", m))?;
        }

        let defaults = ShavingsInventory::empty(user_id, Utc::now());

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO shavings_inventory (
                user_id, current_bags, reorder_threshold, bags_per_order, supplier, cost_per_bag
            )
            VALUES ($1, $2, COALESCE($3, $7), $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET current_bags = EXCLUDED.current_bags,
                reorder_threshold = COALESCE($3, shavings_inventory.reorder_threshold),
                bags_per_order = EXCLUDED.bags_per_order,
                supplier = EXCLUDED.supplier,
                cost_per_bag = EXCLUDED.cost_per_bag,
                last_updated = NOW()
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.current_bags)
        .bind(input.reorder_threshold)
        .bind(input.bags_per_order)
        .bind(&input.supplier)
        .bind(input.cost_per_bag)
        .bind(defaults.reorder_threshold)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Record received bags; settles any pending order
    pub async fn record_delivery(
        &self,
        user_id: &str,
        input: DeliveryInput,
    ) -> AppResult<ShavingsInventory> {
        input.validate()?;
        shared::validate_delivery_quantity(input.bags_received)
            .map_err(|m| AppError::invalid("bags_received", m))?;
        let now = Utc::now();
        let delivered_at = input.delivered_at.unwrap_or_else(|| now.date_naive());

        let mut tx = self.db.begin().await?;
        let current = lock_inventory(&mut tx, user_id)
            .await?
            .unwrap_or_else(|| ShavingsInventory::empty(user_id, now));
        let updated = current.with_delivery(input.bags_received, now);

        let inventory = save_inventory(&mut tx, &updated).await?;

        sqlx::query(
            r#"
            INSERT INTO shavings_deliveries (user_id, bags_received, delivered_at, supplier, notes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(input.bags_received)
        .bind(delivered_at)
        .bind(input.supplier.as_ref().or(current.supplier.as_ref()))
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            bags = %input.bags_received,
            total = %inventory.current_bags,
            "Shavings delivery recorded"
        );
        Ok(inventory)
    }

    /// Most recent deliveries first
    pub async fn list_deliveries(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> AppResult<Vec<ShavingsDelivery>> {
        let limit = limit.unwrap_or(DEFAULT_DELIVERY_LIMIT).clamp(1, 100);

        let rows = sqlx::query_as::<_, DeliveryRow>(
            r#"
            SELECT id, bags_received, delivered_at, supplier, notes, created_at
            FROM shavings_deliveries
            WHERE user_id = $1
            ORDER BY delivered_at DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark an order as placed today
    pub async fn place_order(
        &self,
        user_id: &str,
        input: OrderInput,
    ) -> AppResult<ShavingsInventory> {
        let now = Utc::now();
        let today = now.date_naive();
        if input.expected_delivery_date.is_some_and(|d| d < today) {
            return Err(AppError::invalid(
                "expected_delivery_date",
                "Expected delivery cannot be in the past",
            ));
        }

        let mut tx = self.db.begin().await?;
        let current = lock_inventory(&mut tx, user_id)
            .await?
            .unwrap_or_else(|| ShavingsInventory::empty(user_id, now));
        let updated = current.with_order_placed(today, input.expected_delivery_date, now);
        let inventory = save_inventory(&mut tx, &updated).await?;
        tx.commit().await?;

        tracing::info!(expected = ?input.expected_delivery_date, "Shavings order placed");
        Ok(inventory)
    }
}

async fn lock_inventory(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
) -> AppResult<Option<ShavingsInventory>> {
    let row = sqlx::query_as::<_, InventoryRow>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM shavings_inventory WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(Into::into))
}

async fn save_inventory(
    tx: &mut Transaction<'_, Postgres>,
    inventory: &ShavingsInventory,
) -> AppResult<ShavingsInventory> {
    let row = sqlx::query_as::<_, InventoryRow>(&format!(
        r#"
        INSERT INTO shavings_inventory (
            user_id, current_bags, reorder_threshold, bags_per_order, supplier, cost_per_bag,
            pending_order_date, expected_delivery_date, last_updated
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id) DO UPDATE
        SET current_bags = EXCLUDED.current_bags,
            pending_order_date = EXCLUDED.pending_order_date,
            expected_delivery_date = EXCLUDED.expected_delivery_date,
            last_updated = EXCLUDED.last_updated
        RETURNING {INVENTORY_COLUMNS}
        "#
    ))
    .bind(&inventory.user_id)
    .bind(inventory.current_bags)
    .bind(inventory.reorder_threshold)
    .bind(inventory.bags_per_order)
    .bind(&inventory.supplier)
    .bind(inventory.cost_per_bag)
    .bind(inventory.pending_order_date)
    .bind(inventory.expected_delivery_date)
    .bind(inventory.last_updated)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}
