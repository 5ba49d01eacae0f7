//! # bahi-db: Ledger Storage
//!
//! SQLite persistence for inventory, sales and expenses, one owner's rows
//! always filtered by `owner_id`.
//!
//! ```text
//!   ActionExecutor (bahi-assist)
//!        │  db.inventory() / db.sales() / db.expenses()
//!        ▼
//!   Database ── SqlitePool ── bahi.db (WAL)
//!        │
//!        ├── InventoryRepository   create, find_by_name, adjust, list
//!        ├── SaleRepository        record_sale (one write transaction)
//!        └── ExpenseRepository     insert, list_for_owner
//! ```
//!
//! The schema ships inside the binary ([`migrations`]) and is applied when
//! the pool opens.
//!
//! ```rust,ignore
//! use bahi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bahi.db")).await?;
//! let pepsi = db.inventory().find_by_name(&owner, "pepsi").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::expense::ExpenseRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::sale::SaleRepository;
