//! # Inventory Repository
//!
//! Stock items per owner.
//!
//! ## Name Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator says: "PEPSI"                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_item_name("PEPSI") → "pepsi"                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────┐                       │
//! │  │ inventory  UNIQUE(owner_id, name_key)        │                       │
//! │  │                                              │                       │
//! │  │ owner-1 | Pepsi     | pepsi     │ ← MATCH    │                       │
//! │  │ owner-1 | Pepsi Max | pepsi max │            │                       │
//! │  │ owner-2 | Pepsi     | pepsi     │ (other)    │                       │
//! │  └──────────────────────────────────────────────┘                       │
//! │                                                                         │
//! │  Exact key equality: no LIKE, no prefix match.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};
use bahi_core::{
    normalize_item_name, CoreError, InventoryRecord, NewInventoryItem, OwnerId, StockAdjustment,
};

const RECORD_COLUMNS: &str =
    "id, owner_id, item_name, category, stock_qty, price_per_unit, created_at, updated_at";

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Finds an item by case-insensitive exact name.
    pub async fn find_by_name(
        &self,
        owner: &OwnerId,
        name: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let key = normalize_item_name(name);
        debug!(owner_id = %owner, name_key = %key, "Looking up inventory item");

        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE owner_id = ?1 AND name_key = ?2"
        ))
        .bind(owner)
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets an item by id, scoped to the owner.
    pub async fn get_by_id(&self, owner: &OwnerId, id: &str) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE owner_id = ?1 AND id = ?2"
        ))
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists all of an owner's items, alphabetically.
    pub async fn list(&self, owner: &OwnerId) -> DbResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE owner_id = ?1 ORDER BY name_key"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        debug!(owner_id = %owner, count = records.len(), "Listed inventory");
        Ok(records)
    }

    /// The owner's item names, as spelled by the owner.
    ///
    /// This is the vocabulary handed to the interpreter.
    pub async fn list_names(&self, owner: &OwnerId) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT item_name FROM inventory WHERE owner_id = ?1 ORDER BY name_key",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Counts the owner's items.
    pub async fn count(&self, owner: &OwnerId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE owner_id = ?1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Creates a new item.
    ///
    /// ## Errors
    /// - `CoreError::DuplicateItem` if the owner already has an item with the
    ///   same normalized name
    pub async fn create(
        &self,
        owner: &OwnerId,
        item: &NewInventoryItem,
    ) -> DbResult<InventoryRecord> {
        let now = Utc::now();
        let record = InventoryRecord {
            id: generate_id(),
            owner_id: owner.clone(),
            item_name: item.item_name.trim().to_string(),
            category: item.category.clone(),
            stock_qty: item.quantity,
            price_per_unit: item.price_per_unit,
            created_at: now,
            updated_at: now,
        };

        debug!(owner_id = %owner, item = %record.item_name, "Creating inventory item");

        let result = sqlx::query(
            r#"
            INSERT INTO inventory (
                id, owner_id, item_name, name_key, category,
                stock_qty, price_per_unit, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.item_name)
        .bind(normalize_item_name(&record.item_name))
        .bind(&record.category)
        .bind(record.stock_qty)
        .bind(record.price_per_unit)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => {
                    Err(CoreError::DuplicateItem(record.item_name).into())
                }
                other => Err(other),
            },
        }
    }

    /// Applies a signed stock delta and optionally a new unit price.
    ///
    /// The non-negativity check is part of the UPDATE itself, so two
    /// concurrent corrections can never push stock below zero together.
    ///
    /// ## Errors
    /// - `CoreError::ItemNotFound` if no item matches the name
    /// - `CoreError::NegativeStock` if the delta would leave stock below zero
    pub async fn adjust(
        &self,
        owner: &OwnerId,
        adjustment: &StockAdjustment,
    ) -> DbResult<InventoryRecord> {
        let key = normalize_item_name(&adjustment.item_name);
        debug!(
            owner_id = %owner,
            name_key = %key,
            delta = adjustment.delta,
            "Adjusting inventory"
        );

        let updated = sqlx::query_as::<_, InventoryRecord>(&format!(
            r#"
            UPDATE inventory SET
                stock_qty = stock_qty + ?3,
                price_per_unit = COALESCE(?4, price_per_unit),
                updated_at = ?5
            WHERE owner_id = ?1 AND name_key = ?2 AND stock_qty + ?3 >= 0
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&key)
        .bind(adjustment.delta)
        .bind(adjustment.price_per_unit)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = updated {
            return Ok(record);
        }

        // Nothing updated: either the item is missing or the delta is too large
        match self.find_by_name(owner, &adjustment.item_name).await? {
            None => Err(CoreError::ItemNotFound(adjustment.item_name.clone()).into()),
            Some(current) => Err(CoreError::NegativeStock {
                item: current.item_name,
                current: current.stock_qty,
                delta: adjustment.delta,
            }
            .into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
