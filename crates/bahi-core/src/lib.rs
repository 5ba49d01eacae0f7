//! # bahi-core: Pure Domain Logic for Bahi
//!
//! This crate holds everything about the ledger that can be decided without
//! touching a disk or a network: money, records, intents, validation, sale
//! totals and the human-readable messages.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bahi Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/console                                 │   │
//! │  │    free text ──► preview ──► y/n ──► result                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bahi-assist                                  │   │
//! │  │    interpreter ─► stage ─► consume ─► executor                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bahi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  intent   │  │ validation│  │   │
//! │  │   │ Inventory │  │   Money   │  │  Drafts   │  │  drafts → │  │   │
//! │  │   │ Sale      │  │  paise    │  │  Payloads │  │  payloads │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bahi-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (InventoryRecord, Sale, ExpenseRecord, ids)
//! - [`money`] - Money type with integer paise arithmetic
//! - [`intent`] - Interpreter drafts, validated payloads, pending actions
//! - [`validation`] - Draft → payload validation
//! - [`message`] - Preview and result text in every supported language
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bahi_core::{LineItem, Money, SaleTotals};
//!
//! let items = vec![LineItem {
//!     item_name: "Pepsi".to_string(),
//!     quantity: 5,
//!     selling_price_per_unit: Money::from_rupees(30),
//!     cost_per_unit: Money::from_rupees(20),
//! }];
//!
//! let totals = SaleTotals::compute(&items).unwrap();
//! assert_eq!(totals.total_amount, Money::from_rupees(150));
//! assert_eq!(totals.gross_profit, Money::from_rupees(50));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod intent;
pub mod message;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use intent::*;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// How long a staged action waits for confirmation before it expires.
pub const CONFIRMATION_TTL_SECS: u64 = 300;

/// Maximum line items in one sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity on one sale line.
///
/// ## Business Reason
/// Guards against interpreter mis-reads ("5" heard as "5000000").
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Ceiling for a unit price or an expense amount, in paise (₹100 crore).
///
/// With at most `MAX_SALE_LINES` lines of `MAX_LINE_QUANTITY` units each,
/// a sale total stays below `10^18` paise, inside `i64`.
pub const MAX_UNIT_PRICE_PAISE: i64 = 100_000_000_000;

/// Category given to inventory items created without one.
pub const DEFAULT_ITEM_CATEGORY: &str = "General";

/// Interpreter confidence below this is treated as "not an action".
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.6;

/// Maximum length of item names, descriptions and categories.
pub const MAX_NAME_LEN: usize = 200;
