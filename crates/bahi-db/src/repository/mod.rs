//! # Repository Module
//!
//! Database repository implementations for the Bahi ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  ActionExecutor                                                         │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(&owner, &request)                       │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── record_sale(&self, owner, request)   ← one transaction             │
//! │  ├── get_by_id(&self, owner, id)                                        │
//! │  └── list_for_owner(&self, owner, limit)                                │
//! │       │                                                                 │
//! │       │  SQL Query (always filtered by owner_id)                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Stock items, name lookup, adjustments
//! - [`sale::SaleRepository`] - Atomic sale recording and sale reads
//! - [`expense::ExpenseRepository`] - Expense records

pub mod expense;
pub mod inventory;
pub mod sale;

use uuid::Uuid;

/// Generates a new record id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
