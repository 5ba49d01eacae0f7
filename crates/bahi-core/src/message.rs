//! # Message Composer
//!
//! Human-readable previews and results, per action kind and language.
//!
//! Every function is an exhaustive `match` over (kind × language), so adding a
//! kind or a language fails to compile until each message exists.
//!
//! These strings only describe outcomes. Nothing in the pipeline reads them to
//! decide whether to execute.

use crate::intent::{ActionPayload, ActionResult, SaleRequest};
use crate::types::{Language, Sale};

/// Describes a staged action before it runs.
pub fn preview(payload: &ActionPayload, language: Language) -> String {
    match (payload, language) {
        (ActionPayload::RecordSale(sale), Language::English) => format!(
            "Record sale of {} for {} ({}). Confirm?",
            sale_lines(sale),
            sale_total(sale),
            sale.payment_method
        ),
        (ActionPayload::RecordSale(sale), Language::Hindi) => format!(
            "{} की बिक्री, कुल {} ({})। पुष्टि करें?",
            sale_lines(sale),
            sale_total(sale),
            sale.payment_method
        ),
        (ActionPayload::RecordExpense(exp), Language::English) => format!(
            "Record expense of {} for {} ({}). Confirm?",
            exp.amount, exp.description, exp.category
        ),
        (ActionPayload::RecordExpense(exp), Language::Hindi) => format!(
            "{} ({}) के लिए {} का खर्च दर्ज करें। पुष्टि करें?",
            exp.description, exp.category, exp.amount
        ),
        (ActionPayload::AdjustInventory(adj), Language::English) => {
            let mut text = format!("Adjust {} stock by {:+}", adj.item_name, adj.delta);
            if let Some(price) = adj.price_per_unit {
                text.push_str(&format!(" and set price to {price}"));
            }
            text.push_str(". Confirm?");
            text
        }
        (ActionPayload::AdjustInventory(adj), Language::Hindi) => {
            let mut text = format!("{} का स्टॉक {:+} बदलें", adj.item_name, adj.delta);
            if let Some(price) = adj.price_per_unit {
                text.push_str(&format!(", कीमत {price} करें"));
            }
            text.push_str("। पुष्टि करें?");
            text
        }
        (ActionPayload::CreateInventoryItem(item), Language::English) => format!(
            "Add new item {} ({}) with {} units at {} each. Confirm?",
            item.item_name, item.category, item.quantity, item.price_per_unit
        ),
        (ActionPayload::CreateInventoryItem(item), Language::Hindi) => format!(
            "नया सामान {} ({}) जोड़ें, {} नग, {} प्रति नग। पुष्टि करें?",
            item.item_name, item.category, item.quantity, item.price_per_unit
        ),
    }
}

/// Describes a completed action.
pub fn success(result: &ActionResult, language: Language) -> String {
    match (result, language) {
        (ActionResult::Sale(sale), Language::English) => format!(
            "Sale recorded: {} ({} items), profit {}.",
            sale.total_amount,
            sold_units(sale),
            sale.gross_profit
        ),
        (ActionResult::Sale(sale), Language::Hindi) => format!(
            "बिक्री दर्ज हुई: {} ({} नग), मुनाफ़ा {}।",
            sale.total_amount,
            sold_units(sale),
            sale.gross_profit
        ),
        (ActionResult::Expense(exp), Language::English) => {
            format!("Expense of {} recorded under {}.", exp.amount, exp.category)
        }
        (ActionResult::Expense(exp), Language::Hindi) => {
            format!("{} का खर्च {} में दर्ज हुआ।", exp.amount, exp.category)
        }
        (ActionResult::InventoryAdjusted { record, .. }, Language::English) => format!(
            "{} now has {} in stock at {} each.",
            record.item_name, record.stock_qty, record.price_per_unit
        ),
        (ActionResult::InventoryAdjusted { record, .. }, Language::Hindi) => format!(
            "{} का स्टॉक अब {} है, {} प्रति नग।",
            record.item_name, record.stock_qty, record.price_per_unit
        ),
        (ActionResult::InventoryCreated(record), Language::English) => format!(
            "Added {} with {} in stock.",
            record.item_name, record.stock_qty
        ),
        (ActionResult::InventoryCreated(record), Language::Hindi) => format!(
            "{} जोड़ा गया, स्टॉक {}।",
            record.item_name, record.stock_qty
        ),
    }
}

/// Acknowledges a cancelled action.
pub fn cancelled(language: Language) -> String {
    match language {
        Language::English => "Cancelled. Nothing was recorded.".to_string(),
        Language::Hindi => "रद्द किया गया। कुछ भी दर्ज नहीं हुआ।".to_string(),
    }
}

fn sale_lines(sale: &SaleRequest) -> String {
    sale.lines
        .iter()
        .map(|l| format!("{} × {} @ {}", l.quantity, l.item_name, l.selling_price_per_unit))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validated requests always have a total; a hand-built one that overflows
/// shows as "?" rather than a wrong figure.
fn sale_total(sale: &SaleRequest) -> String {
    sale.preview_total()
        .map_or_else(|| "?".to_string(), |total| total.to_string())
}

fn sold_units(sale: &Sale) -> i64 {
    sale.items.iter().map(|l| l.item.quantity).sum()
}
