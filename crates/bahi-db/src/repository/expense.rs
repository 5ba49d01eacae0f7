//! # Expense Repository
//!
//! Expense records per owner. Rows are insert-only.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use bahi_core::{ExpenseRecord, ExpenseRequest, OwnerId};

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense dated today (UTC).
    pub async fn insert(&self, owner: &OwnerId, request: &ExpenseRequest) -> DbResult<ExpenseRecord> {
        let now = Utc::now();
        let record = ExpenseRecord {
            id: generate_id(),
            owner_id: owner.clone(),
            amount: request.amount,
            description: request.description.clone(),
            category: request.category.clone(),
            expense_date: now.date_naive(),
            created_at: now,
        };

        debug!(
            owner_id = %owner,
            amount = record.amount.paise(),
            category = %record.category,
            "Inserting expense"
        );

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, owner_id, amount, description, category, expense_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(record.amount)
        .bind(&record.description)
        .bind(&record.category)
        .bind(record.expense_date)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists an owner's most recent expenses, newest first.
    pub async fn list_for_owner(&self, owner: &OwnerId, limit: u32) -> DbResult<Vec<ExpenseRecord>> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            SELECT id, owner_id, amount, description, category, expense_date, created_at
            FROM expenses
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Counts an owner's expenses.
    pub async fn count_for_owner(&self, owner: &OwnerId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE owner_id = ?1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bahi_core::Money;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = OwnerId::from("owner-1");

        let record = db
            .expenses()
            .insert(
                &owner,
                &ExpenseRequest {
                    amount: Money::from_rupees(1200),
                    description: "Electricity".to_string(),
                    category: "Electricity".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.expense_date, record.created_at.date_naive());

        let listed = db.expenses().list_for_owner(&owner, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount, Money::from_rupees(1200));
        assert_eq!(listed[0].category, "Electricity");

        let other = OwnerId::from("owner-2");
        assert_eq!(db.expenses().count_for_owner(&other).await.unwrap(), 0);
        assert_eq!(db.expenses().count_for_owner(&owner).await.unwrap(), 1);
    }
}
