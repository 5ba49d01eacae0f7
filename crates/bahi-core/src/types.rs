//! # Domain Types
//!
//! Records kept in the owner's ledger, plus the small value types they share.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryRecord │   │      Sale       │   │  ExpenseRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  owner_id       │   │  owner_id       │   │  owner_id       │       │
//! │  │  item_name      │   │  items[]        │   │  amount         │       │
//! │  │  stock_qty ≥ 0  │   │  total_amount   │   │  description    │       │
//! │  │  price_per_unit │   │  total_cogs     │   │  category       │       │
//! │  └─────────────────┘   │  gross_profit   │   │  expense_date   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    OwnerId      │   │ PaymentMethod   │   │    Language     │       │
//! │  │ ConfirmationId  │   │  Cash, Upi,     │   │  en, hi         │       │
//! │  │  (newtypes)     │   │  Card, Credit   │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Every record carries the `owner_id` of exactly one business account.
//! Lookups always filter by owner; there is no cross-owner read path.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

/// The business account that owns a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        OwnerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        OwnerId(s.to_string())
    }
}

/// Opaque token naming one staged action.
///
/// Generated from a UUID v4 in simple form (32 lowercase hex characters), so
/// it is unique and cannot be guessed from other ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(String);

impl ConfirmationId {
    /// Generates a fresh confirmation id.
    pub fn generate() -> Self {
        ConfirmationId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfirmationId {
    fn from(s: &str) -> Self {
        ConfirmationId(s.trim().to_string())
    }
}

impl From<String> for ConfirmationId {
    fn from(s: String) -> Self {
        ConfirmationId(s.trim().to_string())
    }
}

// =============================================================================
// Language
// =============================================================================

/// Languages the message composer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

impl Language {
    /// Short language code ("en", "hi").
    pub const fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            _ => Err(ValidationError::NotAllowed {
                field: "language".to_string(),
                allowed: vec!["en".to_string(), "hi".to_string()],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash over the counter.
    #[default]
    Cash,
    /// UPI transfer.
    Upi,
    /// Card on an external terminal.
    Card,
    /// Goods given on credit (udhaar).
    Credit,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            "credit" | "udhaar" => Ok(PaymentMethod::Credit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: ["cash", "upi", "card", "credit"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// One stocked item.
///
/// `item_name` keeps the owner's spelling; matching always goes through
/// [`normalize_item_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: String,
    pub owner_id: OwnerId,
    pub item_name: String,
    pub category: String,
    /// Units on hand. Never negative.
    pub stock_qty: i64,
    /// Cost basis per unit, used as COGS when the item is sold.
    pub price_per_unit: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup key for item names: trimmed and lowercased.
///
/// "  Pepsi " and "PEPSI" share a key; "Pepsi Max" does not.
pub fn normalize_item_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a sale, with both the selling price and the cost basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_name: String,
    pub quantity: i64,
    pub selling_price_per_unit: Money,
    pub cost_per_unit: Money,
}

impl LineItem {
    /// Revenue for this line. `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.selling_price_per_unit.checked_multiply_quantity(self.quantity)
    }

    /// Cost of goods sold for this line. `None` on overflow.
    pub fn line_cogs(&self) -> Option<Money> {
        self.cost_per_unit.checked_multiply_quantity(self.quantity)
    }
}

/// Aggregates of a sale.
///
/// ```text
/// total_amount = Σ qty · selling_price
/// total_cogs   = Σ qty · cost
/// gross_profit = total_amount − total_cogs
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub total_amount: Money,
    pub total_cogs: Money,
    pub gross_profit: Money,
}

impl SaleTotals {
    /// `None` if any product or sum leaves the `i64` paise range.
    pub fn compute(items: &[LineItem]) -> Option<Self> {
        let mut total_amount = Money::zero();
        let mut total_cogs = Money::zero();
        for item in items {
            total_amount = total_amount.checked_add(item.line_total()?)?;
            total_cogs = total_cogs.checked_add(item.line_cogs()?)?;
        }

        Some(SaleTotals {
            total_amount,
            total_cogs,
            gross_profit: total_amount.checked_sub(total_cogs)?,
        })
    }
}

/// A persisted line: the [`LineItem`] plus the inventory row it drew from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub inventory_id: String,
    #[serde(flatten)]
    pub item: LineItem,
    pub line_total: Money,
    pub line_cogs: Money,
}

/// A recorded sale. Created once by the executor and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub owner_id: OwnerId,
    pub items: Vec<SaleLine>,
    pub total_amount: Money,
    pub total_cogs: Money,
    pub gross_profit: Money,
    pub payment_method: PaymentMethod,
    pub customer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Recomputes the aggregates from the lines.
    pub fn recomputed_totals(&self) -> Option<SaleTotals> {
        let items: Vec<LineItem> = self.items.iter().map(|l| l.item.clone()).collect();
        SaleTotals::compute(&items)
    }

    /// Whether the stored aggregates match the lines.
    pub fn totals_consistent(&self) -> bool {
        let Some(t) = self.recomputed_totals() else {
            return false;
        };
        t.total_amount == self.total_amount
            && t.total_cogs == self.total_cogs
            && t.gross_profit == self.gross_profit
            && self.gross_profit == self.total_amount - self.total_cogs
    }
}

// =============================================================================
// Expense
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub owner_id: OwnerId,
    pub amount: Money,
    pub description: String,
    pub category: String,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, qty: i64, price: i64, cost: i64) -> LineItem {
        LineItem {
            item_name: name.to_string(),
            quantity: qty,
            selling_price_per_unit: Money::from_rupees(price),
            cost_per_unit: Money::from_rupees(cost),
        }
    }

    #[test]
    fn test_sale_totals() {
        let totals =
            SaleTotals::compute(&[line("Pepsi", 5, 30, 20), line("Rice", 2, 60, 45)]).unwrap();
        assert_eq!(totals.total_amount, Money::from_rupees(270));
        assert_eq!(totals.total_cogs, Money::from_rupees(190));
        assert_eq!(totals.gross_profit, Money::from_rupees(80));
    }

    #[test]
    fn test_sale_totals_loss() {
        let totals = SaleTotals::compute(&[line("Milk", 1, 20, 25)]).unwrap();
        assert_eq!(totals.gross_profit, Money::from_rupees(-5));
    }

    #[test]
    fn test_sale_totals_overflow_is_none() {
        let huge = LineItem {
            item_name: "Gold".to_string(),
            quantity: 100,
            selling_price_per_unit: Money::from_rupees(1_000_000_000_000_000),
            cost_per_unit: Money::zero(),
        };
        assert_eq!(huge.line_total(), None);
        assert_eq!(SaleTotals::compute(&[huge]), None);

        let half = LineItem {
            item_name: "Gold".to_string(),
            quantity: 1,
            selling_price_per_unit: Money::from_paise(i64::MAX / 2 + 1),
            cost_per_unit: Money::zero(),
        };
        assert_eq!(SaleTotals::compute(&[half.clone(), half]), None);
    }

    #[test]
    fn test_normalize_item_name() {
        assert_eq!(normalize_item_name("  Pepsi "), "pepsi");
        assert_eq!(normalize_item_name("PEPSI"), normalize_item_name("pepsi"));
        assert_ne!(normalize_item_name("Pepsi Max"), normalize_item_name("Pepsi"));
    }

    #[test]
    fn test_confirmation_id_shape() {
        let a = ConfirmationId::generate();
        let b = ConfirmationId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("Hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"hi\"");
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("udhaar".parse::<PaymentMethod>().unwrap(), PaymentMethod::Credit);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_sale_totals_consistency_check() {
        let items = vec![line("Pepsi", 5, 30, 20)];
        let totals = SaleTotals::compute(&items).unwrap();
        let mut sale = Sale {
            id: "s1".to_string(),
            owner_id: OwnerId::from("o1"),
            items: items
                .into_iter()
                .map(|item| SaleLine {
                    inventory_id: "i1".to_string(),
                    line_total: item.line_total().unwrap(),
                    line_cogs: item.line_cogs().unwrap(),
                    item,
                })
                .collect(),
            total_amount: totals.total_amount,
            total_cogs: totals.total_cogs,
            gross_profit: totals.gross_profit,
            payment_method: PaymentMethod::Cash,
            customer: None,
            created_at: Utc::now(),
        };
        assert!(sale.totals_consistent());

        sale.gross_profit = Money::zero();
        assert!(!sale.totals_consistent());
    }
}
