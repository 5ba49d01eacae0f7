//! # Sale Repository
//!
//! Records sales together with their stock decrements, and reads them back.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record_sale()                                     │
//! │                                                                         │
//! │  BEGIN IMMEDIATE         ← takes the write lock before the first read   │
//! │    │                                                                    │
//! │    ├── 1. RESOLVE   every line → inventory row (ItemNotFound)           │
//! │    ├── 2. VALIDATE  Σ qty per item ≤ stock_qty (InsufficientStock)      │
//! │    │        nothing has been written yet                                │
//! │    ├── 3. INSERT    sales + sale_items (cost = price_per_unit)          │
//! │    └── 4. DECREMENT per line, guarded by stock_qty >= qty               │
//! │    │                                                                    │
//! │  COMMIT  (error above, or the future dropped → ROLLBACK)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two concurrent sales of the same item are strictly ordered by the write
//! lock, so the second one validates against the stock the first one left.
//! The guarded decrement in step 4 is a recheck: it can only fail if some
//! writer bypassed this path, and that is logged as an inconsistency.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::generate_id;
use crate::error::{DbError, DbResult};
use bahi_core::{
    normalize_item_name, CoreError, InventoryRecord, LineItem, Money, OwnerId, PaymentMethod,
    Sale, SaleLine, SaleRequest, SaleTotals, ValidationError,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    owner_id: OwnerId,
    total_amount: Money,
    total_cogs: Money,
    gross_profit: Money,
    payment_method: PaymentMethod,
    customer: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    inventory_id: String,
    item_name: String,
    quantity: i64,
    selling_price_per_unit: Money,
    cost_per_unit: Money,
    line_total: Money,
    line_cogs: Money,
}

impl From<SaleItemRow> for SaleLine {
    fn from(row: SaleItemRow) -> Self {
        SaleLine {
            inventory_id: row.inventory_id,
            item: LineItem {
                item_name: row.item_name,
                quantity: row.quantity,
                selling_price_per_unit: row.selling_price_per_unit,
                cost_per_unit: row.cost_per_unit,
            },
            line_total: row.line_total,
            line_cogs: row.line_cogs,
        }
    }
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleLine>) -> Sale {
        Sale {
            id: self.id,
            owner_id: self.owner_id,
            items,
            total_amount: self.total_amount,
            total_cogs: self.total_cogs,
            gross_profit: self.gross_profit,
            payment_method: self.payment_method,
            customer: self.customer,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and decrements stock for every line, atomically.
    ///
    /// ## Errors
    /// - `CoreError::ItemNotFound` for a line naming an unknown item
    /// - `CoreError::InsufficientStock` naming the first short item
    /// - `DbError::TransactionFailed` if the write lock or commit fails
    ///
    /// On any error no sale row exists and no stock has moved. The same holds
    /// if the returned future is dropped part way: the open `Transaction`
    /// rolls back before its connection is reused.
    pub async fn record_sale(&self, owner: &OwnerId, request: &SaleRequest) -> DbResult<Sale> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale = match record_sale_locked(&mut *tx, owner, request).await {
            Ok(sale) => sale,
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    error!(
                        inconsistency = true,
                        owner_id = %owner,
                        error = %e,
                        "Failed to roll back sale transaction"
                    );
                }
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            owner_id = %owner,
            sale_id = %sale.id,
            total_amount = sale.total_amount.paise(),
            gross_profit = sale.gross_profit.paise(),
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Gets a sale with its lines, scoped to the owner.
    pub async fn get_by_id(&self, owner: &OwnerId, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, owner_id, total_amount, total_cogs, gross_profit,
                   payment_method, customer, created_at
            FROM sales
            WHERE owner_id = ?1 AND id = ?2
            "#,
        )
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.get_items(&row.id).await?;
                Ok(Some(row.into_sale(items)))
            }
            None => Ok(None),
        }
    }

    /// Lists an owner's most recent sales, newest first.
    pub async fn list_for_owner(&self, owner: &OwnerId, limit: u32) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, owner_id, total_amount, total_cogs, gross_profit,
                   payment_method, customer, created_at
            FROM sales
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.get_items(&row.id).await?;
            sales.push(row.into_sale(items));
        }
        Ok(sales)
    }

    /// Counts an owner's sales.
    pub async fn count_for_owner(&self, owner: &OwnerId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE owner_id = ?1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT inventory_id, item_name, quantity, selling_price_per_unit,
                   cost_per_unit, line_total, line_cogs
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }
}

// =============================================================================
// Transaction Body
// =============================================================================

async fn record_sale_locked(
    conn: &mut SqliteConnection,
    owner: &OwnerId,
    request: &SaleRequest,
) -> DbResult<Sale> {
    // 1. Resolve every line before touching anything
    let mut resolved: Vec<InventoryRecord> = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT id, owner_id, item_name, category, stock_qty, price_per_unit,
                   created_at, updated_at
            FROM inventory
            WHERE owner_id = ?1 AND name_key = ?2
            "#,
        )
        .bind(owner)
        .bind(normalize_item_name(&line.item_name))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(line.item_name.clone()))?;
        resolved.push(record);
    }

    // 2. Validate stock, summing lines that name the same item
    let mut requested: HashMap<&str, i64> = HashMap::new();
    for (line, record) in request.lines.iter().zip(&resolved) {
        *requested.entry(record.id.as_str()).or_insert(0) += line.quantity;
    }
    for record in &resolved {
        let wanted = requested.get(record.id.as_str()).copied().unwrap_or(0);
        if wanted > record.stock_qty {
            return Err(CoreError::InsufficientStock {
                item: record.item_name.clone(),
                available: record.stock_qty,
                requested: wanted,
            }
            .into());
        }
    }

    // 3. Build the sale with cost basis from inventory
    let now = Utc::now();
    let sale_id = generate_id();
    let lines: Vec<SaleLine> = request
        .lines
        .iter()
        .zip(&resolved)
        .map(|(line, record)| {
            let item = LineItem {
                item_name: record.item_name.clone(),
                quantity: line.quantity,
                selling_price_per_unit: line.selling_price_per_unit,
                cost_per_unit: record.price_per_unit,
            };
            Ok(SaleLine {
                inventory_id: record.id.clone(),
                line_total: item.line_total().ok_or_else(total_out_of_range)?,
                line_cogs: item.line_cogs().ok_or_else(total_out_of_range)?,
                item,
            })
        })
        .collect::<DbResult<_>>()?;
    let items: Vec<LineItem> = lines.iter().map(|l| l.item.clone()).collect();
    let totals = SaleTotals::compute(&items).ok_or_else(total_out_of_range)?;

    debug!(sale_id = %sale_id, lines = lines.len(), "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, owner_id, total_amount, total_cogs, gross_profit,
            payment_method, customer, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&sale_id)
    .bind(owner)
    .bind(totals.total_amount)
    .bind(totals.total_cogs)
    .bind(totals.gross_profit)
    .bind(request.payment_method)
    .bind(&request.customer)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for (line_no, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, line_no, inventory_id, item_name, quantity,
                selling_price_per_unit, cost_per_unit, line_total, line_cogs
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(generate_id())
        .bind(&sale_id)
        .bind(line_no as i64)
        .bind(&line.inventory_id)
        .bind(&line.item.item_name)
        .bind(line.item.quantity)
        .bind(line.item.selling_price_per_unit)
        .bind(line.item.cost_per_unit)
        .bind(line.line_total)
        .bind(line.line_cogs)
        .execute(&mut *conn)
        .await?;
    }

    // 4. Decrement with a per-row recheck
    for line in &lines {
        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                stock_qty = stock_qty - ?3,
                updated_at = ?4
            WHERE owner_id = ?1 AND id = ?2 AND stock_qty >= ?3
            "#,
        )
        .bind(owner)
        .bind(&line.inventory_id)
        .bind(line.item.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: i64 = sqlx::query_scalar(
                "SELECT COALESCE((SELECT stock_qty FROM inventory WHERE id = ?1), 0)",
            )
            .bind(&line.inventory_id)
            .fetch_one(&mut *conn)
            .await?;

            error!(
                inconsistency = true,
                owner_id = %owner,
                sale_id = %sale_id,
                inventory_id = %line.inventory_id,
                available,
                requested = line.item.quantity,
                "Stock changed between validation and decrement; rolling back sale"
            );

            return Err(CoreError::InsufficientStock {
                item: line.item.item_name.clone(),
                available,
                requested: line.item.quantity,
            }
            .into());
        }
    }

    Ok(Sale {
        id: sale_id,
        owner_id: owner.clone(),
        items: lines,
        total_amount: totals.total_amount,
        total_cogs: totals.total_cogs,
        gross_profit: totals.gross_profit,
        payment_method: request.payment_method,
        customer: request.customer.clone(),
        created_at: now,
    })
}

fn total_out_of_range() -> DbError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: "sale total".to_string(),
        min: 0,
        max: i64::MAX / 100,
    })
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
