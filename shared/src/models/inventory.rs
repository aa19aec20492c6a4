//! Barn inventory models: supplements and bedding shavings

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default low-stock threshold for a supplement, in its stock unit
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
/// Default days between subscription deliveries
pub const DEFAULT_DELIVERY_FREQUENCY_DAYS: i32 = 30;
/// Default bag count at which shavings should be reordered
pub const DEFAULT_REORDER_THRESHOLD: i64 = 10;

// ============================================================================
// Supplements
// ============================================================================

/// A supplement fed to one horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplement {
    pub id: Uuid,
    pub user_id: String,
    pub horse_id: Uuid,
    /// Denormalised for listing grouped by horse
    pub horse_name: String,
    pub name: String,
    pub brand: Option<String>,
    pub dosage: String,
    pub frequency: SupplementFrequency,
    pub current_stock: Decimal,
    pub stock_unit: StockUnit,
    pub low_stock_threshold: Decimal,
    pub notes: Option<String>,
    pub subscription: Option<Subscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How often a supplement is given
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupplementFrequency {
    Daily,
    TwiceDaily,
    Weekly,
    AsNeeded,
}

impl SupplementFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplementFrequency::Daily => "daily",
            SupplementFrequency::TwiceDaily => "twice_daily",
            SupplementFrequency::Weekly => "weekly",
            SupplementFrequency::AsNeeded => "as_needed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(SupplementFrequency::Daily),
            "twice_daily" => Some(SupplementFrequency::TwiceDaily),
            "weekly" => Some(SupplementFrequency::Weekly),
            "as_needed" => Some(SupplementFrequency::AsNeeded),
            _ => None,
        }
    }
}

/// Unit a supplement's stock is counted in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockUnit {
    Lbs,
    Oz,
    Kg,
    Bags,
    Scoops,
}

impl StockUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockUnit::Lbs => "lbs",
            StockUnit::Oz => "oz",
            StockUnit::Kg => "kg",
            StockUnit::Bags => "bags",
            StockUnit::Scoops => "scoops",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lbs" => Some(StockUnit::Lbs),
            "oz" => Some(StockUnit::Oz),
            "kg" => Some(StockUnit::Kg),
            "bags" => Some(StockUnit::Bags),
            "scoops" => Some(StockUnit::Scoops),
            _ => None,
        }
    }
}

/// Recurring delivery from a supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub is_active: bool,
    pub supplier: Option<String>,
    pub delivery_frequency_days: i32,
    pub quantity_per_delivery: Decimal,
    pub next_delivery_date: Option<NaiveDate>,
    pub last_delivery_date: Option<NaiveDate>,
}

/// Stock level of a supplement relative to its threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    InStock,
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockLevel::OutOfStock => write!(f, "Out of stock"),
            StockLevel::Low => write!(f, "Low stock"),
            StockLevel::InStock => write!(f, "In stock"),
        }
    }
}

/// Classify a stock quantity against a low-stock threshold
pub fn stock_level(current_stock: Decimal, low_stock_threshold: Decimal) -> StockLevel {
    if current_stock <= Decimal::ZERO {
        StockLevel::OutOfStock
    } else if current_stock <= low_stock_threshold {
        StockLevel::Low
    } else {
        StockLevel::InStock
    }
}

impl Supplement {
    pub fn stock_level(&self) -> StockLevel {
        stock_level(self.current_stock, self.low_stock_threshold)
    }

    /// Apply a delivery received on `today`.
    ///
    /// With a subscription, the next delivery is scheduled
    /// `delivery_frequency_days` after today.
    pub fn with_delivery(&self, quantity: Decimal, today: NaiveDate) -> Self {
        let mut next = self.clone();
        next.current_stock += quantity;
        if let Some(sub) = next.subscription.as_mut() {
            sub.last_delivery_date = Some(today);
            sub.next_delivery_date =
                today.checked_add_signed(Duration::days(i64::from(sub.delivery_frequency_days)));
        }
        next
    }
}

// ============================================================================
// Shavings
// ============================================================================

/// Bedding shavings stock, one per user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShavingsInventory {
    pub user_id: String,
    pub current_bags: Decimal,
    pub reorder_threshold: Decimal,
    pub bags_per_order: Option<Decimal>,
    pub supplier: Option<String>,
    pub cost_per_bag: Option<Decimal>,
    pub pending_order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub last_updated: DateTime<Utc>,
}

/// A received shavings delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShavingsDelivery {
    pub id: Uuid,
    pub bags_received: Decimal,
    pub delivered_at: NaiveDate,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shavings stock status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShavingsStatus {
    Stocked,
    Low,
    OrderNow,
    PendingOrder,
}

impl ShavingsStatus {
    /// Status of the (possibly not yet configured) inventory.
    ///
    /// A pending order takes precedence over the stock count.
    pub fn of(inventory: Option<&ShavingsInventory>) -> Self {
        let Some(inv) = inventory else {
            return ShavingsStatus::OrderNow;
        };
        if inv.pending_order_date.is_some() {
            ShavingsStatus::PendingOrder
        } else if inv.current_bags <= Decimal::ZERO {
            ShavingsStatus::OrderNow
        } else if inv.current_bags <= inv.reorder_threshold {
            ShavingsStatus::Low
        } else {
            ShavingsStatus::Stocked
        }
    }
}

impl std::fmt::Display for ShavingsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShavingsStatus::Stocked => write!(f, "Well stocked"),
            ShavingsStatus::Low => write!(f, "Running low, consider ordering"),
            ShavingsStatus::OrderNow => write!(f, "Order now"),
            ShavingsStatus::PendingOrder => write!(f, "Order placed, awaiting delivery"),
        }
    }
}

impl ShavingsInventory {
    /// Empty inventory with default thresholds
    pub fn empty(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            current_bags: Decimal::ZERO,
            reorder_threshold: Decimal::from(DEFAULT_REORDER_THRESHOLD),
            bags_per_order: None,
            supplier: None,
            cost_per_bag: None,
            pending_order_date: None,
            expected_delivery_date: None,
            last_updated: now,
        }
    }

    pub fn status(&self) -> ShavingsStatus {
        ShavingsStatus::of(Some(self))
    }

    /// Add delivered bags; a delivery settles any pending order
    pub fn with_delivery(&self, bags: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            current_bags: self.current_bags + bags,
            pending_order_date: None,
            expected_delivery_date: None,
            last_updated: now,
            ..self.clone()
        }
    }

    pub fn with_order_placed(
        &self,
        today: NaiveDate,
        expected_delivery_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            pending_order_date: Some(today),
            expected_delivery_date,
            last_updated: now,
            ..self.clone()
        }
    }

    /// Cost of one standard order, when both size and price are known
    pub fn order_cost(&self) -> Option<Decimal> {
        Some(self.bags_per_order? * self.cost_per_bag?)
    }
}
