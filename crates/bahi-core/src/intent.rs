//! # Intents and Actions
//!
//! The shapes an action takes on its way from free text to the ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Action Lifecycle Types                             │
//! │                                                                         │
//! │  interpreter reply                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ActionIntent { IntentPayload (drafts, every field optional) }          │
//! │       │  validate_intent()                                              │
//! │       ▼                                                                 │
//! │  ActionPayload (fully typed, ranges checked)                            │
//! │       │  stage                                                          │
//! │       ▼                                                                 │
//! │  PendingAction { confirmation_id, owner_id, payload, created_at }       │
//! │       │  consume + execute                                              │
//! │       ▼                                                                 │
//! │  ActionResult (Sale / ExpenseRecord / InventoryRecord)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drafts mirror the interpreter's JSON exactly (camelCase, prices in rupees)
//! and are never executed. Only an [`ActionPayload`] can reach the executor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{rupees_opt, Money};
use crate::types::{
    ConfirmationId, ExpenseRecord, InventoryRecord, Language, OwnerId, PaymentMethod, Sale,
};

// =============================================================================
// Action Kind
// =============================================================================

/// The closed set of mutations the pipeline can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    RecordSale,
    RecordExpense,
    AdjustInventory,
    CreateInventoryItem,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::RecordSale,
        ActionKind::RecordExpense,
        ActionKind::AdjustInventory,
        ActionKind::CreateInventoryItem,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionKind::RecordSale => "RecordSale",
            ActionKind::RecordExpense => "RecordExpense",
            ActionKind::AdjustInventory => "AdjustInventory",
            ActionKind::CreateInventoryItem => "CreateInventoryItem",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Interpreter Drafts
// =============================================================================

/// One sale line as the interpreter heard it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, with = "rupees_opt")]
    pub selling_price: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    #[serde(default)]
    pub items: Vec<LineItemDraft>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    #[serde(default, with = "rupees_opt")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDraft {
    #[serde(default)]
    pub item_name: Option<String>,
    /// Signed stock change; negative values are corrections.
    #[serde(default)]
    pub delta: Option<i64>,
    #[serde(default, with = "rupees_opt")]
    pub price_per_unit: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemDraft {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, with = "rupees_opt")]
    pub price_per_unit: Option<Money>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The kind-specific part of an intent, tagged by `kind`.
///
/// ```json
/// { "kind": "RecordSale", "items": [{ "itemName": "Pepsi", "quantity": 5, "sellingPrice": 30 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IntentPayload {
    RecordSale(SaleDraft),
    RecordExpense(ExpenseDraft),
    AdjustInventory(AdjustmentDraft),
    CreateInventoryItem(NewItemDraft),
}

impl IntentPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            IntentPayload::RecordSale(_) => ActionKind::RecordSale,
            IntentPayload::RecordExpense(_) => ActionKind::RecordExpense,
            IntentPayload::AdjustInventory(_) => ActionKind::AdjustInventory,
            IntentPayload::CreateInventoryItem(_) => ActionKind::CreateInventoryItem,
        }
    }
}

/// A structured intent produced by the interpreter. Untrusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIntent {
    #[serde(flatten)]
    pub payload: IntentPayload,
    pub confidence: f32,
    #[serde(default)]
    pub language: Option<Language>,
}

impl ActionIntent {
    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }
}

// =============================================================================
// Validated Payloads
// =============================================================================

/// A sale line after validation. Cost is resolved later from inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequestLine {
    pub item_name: String,
    pub quantity: i64,
    pub selling_price_per_unit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub lines: Vec<SaleRequestLine>,
    pub payment_method: PaymentMethod,
    pub customer: Option<String>,
}

impl SaleRequest {
    /// Revenue the sale will book if confirmed. `None` on overflow, which
    /// the validator turns into `OutOfRange` before anything is staged.
    pub fn preview_total(&self) -> Option<Money> {
        self.lines.iter().try_fold(Money::zero(), |total, line| {
            let line_total = line
                .selling_price_per_unit
                .checked_multiply_quantity(line.quantity)?;
            total.checked_add(line_total)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub amount: Money,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub item_name: String,
    /// Zero when only the price changes.
    pub delta: i64,
    pub price_per_unit: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub item_name: String,
    pub quantity: i64,
    pub price_per_unit: Money,
    pub category: String,
}

/// A validated action, ready to stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActionPayload {
    RecordSale(SaleRequest),
    RecordExpense(ExpenseRequest),
    AdjustInventory(StockAdjustment),
    CreateInventoryItem(NewInventoryItem),
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::RecordSale(_) => ActionKind::RecordSale,
            ActionPayload::RecordExpense(_) => ActionKind::RecordExpense,
            ActionPayload::AdjustInventory(_) => ActionKind::AdjustInventory,
            ActionPayload::CreateInventoryItem(_) => ActionKind::CreateInventoryItem,
        }
    }
}

// =============================================================================
// Pending Action
// =============================================================================

/// A staged action awaiting confirmation.
///
/// Lives only inside the confirmation stage. Destroyed by exactly one of
/// confirm, cancel or expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub confirmation_id: ConfirmationId,
    pub owner_id: OwnerId,
    pub kind: ActionKind,
    pub payload: ActionPayload,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub original_text: String,
}

impl PendingAction {
    pub fn new(
        owner_id: OwnerId,
        payload: ActionPayload,
        language: Language,
        original_text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        PendingAction {
            confirmation_id: ConfirmationId::generate(),
            owner_id,
            kind: payload.kind(),
            payload,
            language,
            created_at,
            original_text: original_text.into(),
        }
    }
}

// =============================================================================
// Action Result
// =============================================================================

/// What the executor produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionResult {
    Sale(Sale),
    Expense(ExpenseRecord),
    InventoryAdjusted {
        record: InventoryRecord,
        delta: i64,
    },
    InventoryCreated(InventoryRecord),
}

impl ActionResult {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionResult::Sale(_) => ActionKind::RecordSale,
            ActionResult::Expense(_) => ActionKind::RecordExpense,
            ActionResult::InventoryAdjusted { .. } => ActionKind::AdjustInventory,
            ActionResult::InventoryCreated(_) => ActionKind::CreateInventoryItem,
        }
    }
}
