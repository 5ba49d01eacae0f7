//! # Action Executor
//!
//! Applies a consumed [`PendingAction`] to the owner's ledger.
//!
//! | Kind                | Store call                         | Result              |
//! |---------------------|------------------------------------|---------------------|
//! | RecordSale          | `sales().record_sale` (one txn)    | `Sale`              |
//! | RecordExpense       | `expenses().insert`                | `ExpenseRecord`     |
//! | AdjustInventory     | `inventory().adjust` (guarded)     | `InventoryRecord`   |
//! | CreateInventoryItem | `inventory().create`               | `InventoryRecord`   |
//!
//! The executor never decides whether to run; it is only called with an
//! action the stage has already released.

use tracing::{error, info};

use crate::error::{AssistError, AssistResult};
use bahi_core::{ActionPayload, ActionResult, OwnerId, PendingAction};
use bahi_db::Database;

#[derive(Debug, Clone)]
pub struct ActionExecutor {
    db: Database,
}

impl ActionExecutor {
    pub fn new(db: Database) -> Self {
        ActionExecutor { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Executes a consumed action.
    pub async fn execute(&self, action: &PendingAction) -> AssistResult<ActionResult> {
        let result = self.apply(&action.owner_id, &action.payload).await;

        match &result {
            Ok(_) => info!(
                confirmation_id = %action.confirmation_id,
                owner_id = %action.owner_id,
                kind = %action.kind,
                "Action executed"
            ),
            Err(AssistError::Storage(e)) => error!(
                confirmation_id = %action.confirmation_id,
                owner_id = %action.owner_id,
                error = %e,
                "Action failed in storage"
            ),
            Err(e) => info!(
                confirmation_id = %action.confirmation_id,
                owner_id = %action.owner_id,
                reason = %e,
                "Action rejected"
            ),
        }

        result
    }

    async fn apply(&self, owner: &OwnerId, payload: &ActionPayload) -> AssistResult<ActionResult> {
        let result = match payload {
            ActionPayload::RecordSale(request) => {
                ActionResult::Sale(self.db.sales().record_sale(owner, request).await?)
            }
            ActionPayload::RecordExpense(request) => {
                ActionResult::Expense(self.db.expenses().insert(owner, request).await?)
            }
            ActionPayload::AdjustInventory(adjustment) => ActionResult::InventoryAdjusted {
                record: self.db.inventory().adjust(owner, adjustment).await?,
                delta: adjustment.delta,
            },
            ActionPayload::CreateInventoryItem(item) => {
                ActionResult::InventoryCreated(self.db.inventory().create(owner, item).await?)
            }
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::{
        ExpenseRequest, Language, Money, NewInventoryItem, PaymentMethod, SaleRequest,
        SaleRequestLine, StockAdjustment,
    };
    use bahi_db::DbConfig;
    use chrono::Utc;

    async fn executor() -> ActionExecutor {
        ActionExecutor::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn pending(owner: &OwnerId, payload: ActionPayload) -> PendingAction {
        PendingAction::new(owner.clone(), payload, Language::English, "", Utc::now())
    }

    async fn create_pepsi(exec: &ActionExecutor, owner: &OwnerId) {
        exec.execute(&pending(
            owner,
            ActionPayload::CreateInventoryItem(NewInventoryItem {
                item_name: "Pepsi".to_string(),
                quantity: 10,
                price_per_unit: Money::from_rupees(20),
                category: "Beverages".to_string(),
            }),
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_sale_dispatch() {
        let exec = executor().await;
        let owner = OwnerId::from("owner-1");
        create_pepsi(&exec, &owner).await;

        let result = exec
            .execute(&pending(
                &owner,
                ActionPayload::RecordSale(SaleRequest {
                    lines: vec![SaleRequestLine {
                        item_name: "pepsi".to_string(),
                        quantity: 5,
                        selling_price_per_unit: Money::from_rupees(30),
                    }],
                    payment_method: PaymentMethod::Cash,
                    customer: None,
                }),
            ))
            .await
            .unwrap();

        match result {
            ActionResult::Sale(sale) => {
                assert_eq!(sale.total_amount, Money::from_rupees(150));
                assert_eq!(sale.total_cogs, Money::from_rupees(100));
                assert_eq!(sale.gross_profit, Money::from_rupees(50));
            }
            other => panic!("expected sale, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let exec = executor().await;
        let owner = OwnerId::from("owner-1");
        create_pepsi(&exec, &owner).await;

        let err = exec
            .execute(&pending(
                &owner,
                ActionPayload::CreateInventoryItem(NewInventoryItem {
                    item_name: "PEPSI ".to_string(),
                    quantity: 1,
                    price_per_unit: Money::zero(),
                    category: "General".to_string(),
                }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_adjust_below_zero_is_stock_violation() {
        let exec = executor().await;
        let owner = OwnerId::from("owner-1");
        create_pepsi(&exec, &owner).await;

        let err = exec
            .execute(&pending(
                &owner,
                ActionPayload::AdjustInventory(StockAdjustment {
                    item_name: "Pepsi".to_string(),
                    delta: -11,
                    price_per_unit: None,
                }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssistError::InsufficientStock { available: 10, .. }
        ));

        let result = exec
            .execute(&pending(
                &owner,
                ActionPayload::AdjustInventory(StockAdjustment {
                    item_name: "Pepsi".to_string(),
                    delta: -3,
                    price_per_unit: Some(Money::from_rupees(22)),
                }),
            ))
            .await
            .unwrap();
        match result {
            ActionResult::InventoryAdjusted { record, delta } => {
                assert_eq!(delta, -3);
                assert_eq!(record.stock_qty, 7);
                assert_eq!(record.price_per_unit, Money::from_rupees(22));
            }
            other => panic!("expected adjustment, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adjust_unknown_item() {
        let exec = executor().await;
        let owner = OwnerId::from("owner-1");

        let err = exec
            .execute(&pending(
                &owner,
                ActionPayload::AdjustInventory(StockAdjustment {
                    item_name: "Ghee".to_string(),
                    delta: 5,
                    price_per_unit: None,
                }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_expense_dispatch() {
        let exec = executor().await;
        let owner = OwnerId::from("owner-1");

        let result = exec
            .execute(&pending(
                &owner,
                ActionPayload::RecordExpense(ExpenseRequest {
                    amount: Money::from_rupees(1200),
                    description: "Electricity".to_string(),
                    category: "Electricity".to_string(),
                }),
            ))
            .await
            .unwrap();
        assert!(matches!(result, ActionResult::Expense(ref e) if e.amount == Money::from_rupees(1200)));
        assert_eq!(
            exec.database().expenses().count_for_owner(&owner).await.unwrap(),
            1
        );
    }
}
