//! # Intent Validation
//!
//! Turns an untrusted [`ActionIntent`] into a typed [`ActionPayload`].
//!
//! ## Fail Closed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  interpreter draft                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_intent() ← THIS MODULE                                        │
//! │       │                                                                 │
//! │       ├── confidence too low      → LowConfidence                       │
//! │       ├── required field missing  → Required                            │
//! │       ├── number out of range     → OutOfRange                          │
//! │       │                                                                 │
//! │       └── OK → ActionPayload (stageable)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here guesses. A missing quantity is an error, not "1".

use crate::error::ValidationError;
use crate::intent::{
    ActionIntent, ActionPayload, AdjustmentDraft, ExpenseDraft, ExpenseRequest, IntentPayload,
    NewInventoryItem, NewItemDraft, SaleDraft, SaleRequest, SaleRequestLine, StockAdjustment,
};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::{
    DEFAULT_ITEM_CATEGORY, MAX_LINE_QUANTITY, MAX_NAME_LEN, MAX_SALE_LINES, MAX_UNIT_PRICE_PAISE,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Entry Point
// =============================================================================

/// Validates an interpreter intent.
///
/// ## Rules
/// - `confidence` must be at least `min_confidence`
/// - RecordSale: 1..=100 lines, each with a name, quantity 1..=100 000 and a
///   selling price
/// - RecordExpense: amount, category, description (falls back to category)
/// - AdjustInventory: name plus a non-zero delta or a price
/// - CreateInventoryItem: name; quantity and price default to zero
pub fn validate_intent(
    intent: &ActionIntent,
    min_confidence: f32,
) -> ValidationResult<ActionPayload> {
    if !intent.confidence.is_finite() || intent.confidence < min_confidence {
        return Err(ValidationError::LowConfidence {
            confidence: intent.confidence,
            min: min_confidence,
        });
    }

    match &intent.payload {
        IntentPayload::RecordSale(draft) => validate_sale(draft).map(ActionPayload::RecordSale),
        IntentPayload::RecordExpense(draft) => {
            validate_expense(draft).map(ActionPayload::RecordExpense)
        }
        IntentPayload::AdjustInventory(draft) => {
            validate_adjustment(draft).map(ActionPayload::AdjustInventory)
        }
        IntentPayload::CreateInventoryItem(draft) => {
            validate_new_item(draft).map(ActionPayload::CreateInventoryItem)
        }
    }
}

// =============================================================================
// Per-Kind Validators
// =============================================================================

fn validate_sale(draft: &SaleDraft) -> ValidationResult<SaleRequest> {
    if draft.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if draft.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    let lines = draft
        .items
        .iter()
        .map(|line| {
            let item_name = required_text("item name", line.item_name.as_deref())?;
            let quantity = line.quantity.ok_or_else(|| ValidationError::Required {
                field: "quantity".to_string(),
            })?;
            validate_quantity(quantity)?;
            let selling_price_per_unit =
                line.selling_price.ok_or_else(|| ValidationError::Required {
                    field: "selling price".to_string(),
                })?;
            validate_price(selling_price_per_unit, "selling price")?;

            Ok(SaleRequestLine {
                item_name,
                quantity,
                selling_price_per_unit,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    let payment_method = match draft.payment_method.as_deref().map(str::trim) {
        None | Some("") => PaymentMethod::default(),
        Some(method) => method.parse()?,
    };

    let request = SaleRequest {
        lines,
        payment_method,
        customer: optional_text("customer", draft.customer.as_deref())?,
    };
    if request.preview_total().is_none() {
        return Err(ValidationError::OutOfRange {
            field: "sale total".to_string(),
            min: 0,
            max: i64::MAX / 100,
        });
    }

    Ok(request)
}

fn validate_expense(draft: &ExpenseDraft) -> ValidationResult<ExpenseRequest> {
    let amount = draft.amount.ok_or_else(|| ValidationError::Required {
        field: "amount".to_string(),
    })?;
    validate_price(amount, "amount")?;

    let category = required_text("category", draft.category.as_deref())?;
    let description = match optional_text("description", draft.description.as_deref())? {
        Some(description) => description,
        None => category.clone(),
    };

    Ok(ExpenseRequest {
        amount,
        description,
        category,
    })
}

fn validate_adjustment(draft: &AdjustmentDraft) -> ValidationResult<StockAdjustment> {
    let item_name = required_text("item name", draft.item_name.as_deref())?;
    let delta = draft.delta.unwrap_or(0);

    if delta.abs() > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }
    if let Some(price) = draft.price_per_unit {
        validate_price(price, "price per unit")?;
    }
    if delta == 0 && draft.price_per_unit.is_none() {
        return Err(ValidationError::EmptyAdjustment { item: item_name });
    }

    Ok(StockAdjustment {
        item_name,
        delta,
        price_per_unit: draft.price_per_unit,
    })
}

fn validate_new_item(draft: &NewItemDraft) -> ValidationResult<NewInventoryItem> {
    let item_name = required_text("item name", draft.item_name.as_deref())?;

    let quantity = draft.quantity.unwrap_or(0);
    if !(0..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }

    let price_per_unit = draft.price_per_unit.unwrap_or_default();
    validate_price(price_per_unit, "price per unit")?;

    let category = optional_text("category", draft.category.as_deref())?
        .unwrap_or_else(|| DEFAULT_ITEM_CATEGORY.to_string());

    Ok(NewInventoryItem {
        item_name,
        quantity,
        price_per_unit,
        category,
    })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_LINE_QUANTITY (100 000)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price or amount.
///
/// ## Rules
/// - Zero is allowed (free items, waived fees)
/// - Must not exceed MAX_UNIT_PRICE_PAISE; the error reports rupees
pub fn validate_price(price: Money, field: &str) -> ValidationResult<()> {
    if price.is_negative() || price.paise() > MAX_UNIT_PRICE_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_PAISE / 100,
        });
    }
    Ok(())
}

/// Validates an item name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use bahi_core::validation::validate_item_name;
///
/// assert_eq!(validate_item_name("  Pepsi ").unwrap(), "Pepsi");
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    required_text("item name", Some(name))
}

fn required_text(field: &str, value: Option<&str>) -> ValidationResult<String> {
    optional_text(field, value)?.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// Trims; blank becomes `None`; over-long is an error.
fn optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(Some(value.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::LineItemDraft;
    use crate::DEFAULT_MIN_CONFIDENCE;

    fn intent(payload: IntentPayload) -> ActionIntent {
        ActionIntent {
            payload,
            confidence: 0.9,
            language: None,
        }
    }

    fn sale_line(name: Option<&str>, qty: Option<i64>, price: Option<i64>) -> LineItemDraft {
        LineItemDraft {
            item_name: name.map(str::to_string),
            quantity: qty,
            selling_price: price.map(Money::from_rupees),
        }
    }

    fn sale(items: Vec<LineItemDraft>) -> ActionIntent {
        intent(IntentPayload::RecordSale(SaleDraft {
            items,
            ..Default::default()
        }))
    }

    #[test]
    fn test_valid_sale() {
        let payload =
            validate_intent(&sale(vec![sale_line(Some(" Pepsi "), Some(5), Some(30))]), 0.6)
                .unwrap();
        let ActionPayload::RecordSale(req) = payload else {
            panic!("expected sale");
        };
        assert_eq!(req.lines[0].item_name, "Pepsi");
        assert_eq!(req.payment_method, PaymentMethod::Cash);
        assert_eq!(req.preview_total(), Some(Money::from_rupees(150)));
    }

    #[test]
    fn test_sale_requires_items() {
        assert!(matches!(
            validate_intent(&sale(vec![]), 0.6),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_sale_line_rules() {
        let cases = [
            sale_line(None, Some(1), Some(10)),
            sale_line(Some("  "), Some(1), Some(10)),
            sale_line(Some("Pepsi"), None, Some(10)),
            sale_line(Some("Pepsi"), Some(0), Some(10)),
            sale_line(Some("Pepsi"), Some(-2), Some(10)),
            sale_line(Some("Pepsi"), Some(MAX_LINE_QUANTITY + 1), Some(10)),
            sale_line(Some("Pepsi"), Some(1), None),
        ];
        for line in cases {
            assert!(
                validate_intent(&sale(vec![line.clone()]), 0.6).is_err(),
                "line should be rejected: {line:?}"
            );
        }

        // Zero price is a free item, still valid
        assert!(validate_intent(&sale(vec![sale_line(Some("Pepsi"), Some(1), Some(0))]), 0.6).is_ok());
    }

    #[test]
    fn test_price_ceiling() {
        let ceiling = Money::from_paise(MAX_UNIT_PRICE_PAISE);
        assert!(validate_price(ceiling, "selling price").is_ok());
        assert!(matches!(
            validate_price(Money::from_paise(MAX_UNIT_PRICE_PAISE + 1), "selling price"),
            Err(ValidationError::OutOfRange { max, .. }) if max == MAX_UNIT_PRICE_PAISE / 100
        ));

        // 100 units at ₹1e15 used to overflow the preview total
        let gold = sale(vec![sale_line(Some("Gold"), Some(100), Some(1_000_000_000_000_000))]);
        assert!(matches!(
            validate_intent(&gold, 0.6),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "selling price"
        ));

        let expense = intent(IntentPayload::RecordExpense(ExpenseDraft {
            amount: Some(Money::from_paise(MAX_UNIT_PRICE_PAISE + 1)),
            description: None,
            category: Some("Rent".to_string()),
        }));
        assert!(validate_intent(&expense, 0.6).is_err());
    }

    #[test]
    fn test_largest_valid_sale_total_fits() {
        let lines = (0..MAX_SALE_LINES)
            .map(|i| LineItemDraft {
                item_name: Some(format!("Item {i}")),
                quantity: Some(MAX_LINE_QUANTITY),
                selling_price: Some(Money::from_paise(MAX_UNIT_PRICE_PAISE)),
            })
            .collect();
        let ActionPayload::RecordSale(req) = validate_intent(&sale(lines), 0.6).unwrap() else {
            panic!("expected sale");
        };
        assert_eq!(
            req.preview_total(),
            Some(Money::from_paise(
                MAX_UNIT_PRICE_PAISE * MAX_LINE_QUANTITY * MAX_SALE_LINES as i64
            ))
        );
    }

    #[test]
    fn test_one_bad_line_rejects_whole_sale() {
        let result = validate_intent(
            &sale(vec![
                sale_line(Some("Pepsi"), Some(5), Some(30)),
                sale_line(Some("Chips"), None, Some(10)),
            ]),
            0.6,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_too_many_lines() {
        let lines = (0..=MAX_SALE_LINES)
            .map(|i| sale_line(Some(&format!("Item {i}")), Some(1), Some(1)))
            .collect();
        assert!(validate_intent(&sale(lines), 0.6).is_err());
    }

    #[test]
    fn test_unknown_payment_method() {
        let i = intent(IntentPayload::RecordSale(SaleDraft {
            items: vec![sale_line(Some("Pepsi"), Some(1), Some(30))],
            payment_method: Some("cheque".to_string()),
            customer: Some("   ".to_string()),
        }));
        assert!(matches!(
            validate_intent(&i, 0.6),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_low_confidence() {
        let mut i = sale(vec![sale_line(Some("Pepsi"), Some(5), Some(30))]);
        i.confidence = 0.3;
        assert!(matches!(
            validate_intent(&i, DEFAULT_MIN_CONFIDENCE),
            Err(ValidationError::LowConfidence { .. })
        ));

        i.confidence = f32::NAN;
        assert!(validate_intent(&i, DEFAULT_MIN_CONFIDENCE).is_err());
    }

    #[test]
    fn test_expense_description_falls_back_to_category() {
        let i = intent(IntentPayload::RecordExpense(ExpenseDraft {
            amount: Some(Money::from_rupees(1200)),
            description: None,
            category: Some("Electricity".to_string()),
        }));
        let ActionPayload::RecordExpense(req) = validate_intent(&i, 0.6).unwrap() else {
            panic!("expected expense");
        };
        assert_eq!(req.amount, Money::from_rupees(1200));
        assert_eq!(req.description, "Electricity");
        assert_eq!(req.category, "Electricity");
    }

    #[test]
    fn test_expense_requires_amount_and_category() {
        let no_amount = intent(IntentPayload::RecordExpense(ExpenseDraft {
            amount: None,
            description: Some("rent".to_string()),
            category: Some("Rent".to_string()),
        }));
        assert!(validate_intent(&no_amount, 0.6).is_err());

        let no_category = intent(IntentPayload::RecordExpense(ExpenseDraft {
            amount: Some(Money::from_rupees(100)),
            description: Some("rent".to_string()),
            category: None,
        }));
        assert!(validate_intent(&no_category, 0.6).is_err());
    }

    #[test]
    fn test_adjustment_rules() {
        let empty = intent(IntentPayload::AdjustInventory(AdjustmentDraft {
            item_name: Some("Sugar".to_string()),
            delta: Some(0),
            price_per_unit: None,
        }));
        assert!(matches!(
            validate_intent(&empty, 0.6),
            Err(ValidationError::EmptyAdjustment { .. })
        ));

        let correction = intent(IntentPayload::AdjustInventory(AdjustmentDraft {
            item_name: Some("Sugar".to_string()),
            delta: Some(-3),
            price_per_unit: None,
        }));
        let ActionPayload::AdjustInventory(adj) = validate_intent(&correction, 0.6).unwrap() else {
            panic!("expected adjustment");
        };
        assert_eq!(adj.delta, -3);

        let price_only = intent(IntentPayload::AdjustInventory(AdjustmentDraft {
            item_name: Some("Sugar".to_string()),
            delta: None,
            price_per_unit: Some(Money::from_rupees(42)),
        }));
        assert!(validate_intent(&price_only, 0.6).is_ok());

        let nameless = intent(IntentPayload::AdjustInventory(AdjustmentDraft {
            item_name: None,
            delta: Some(4),
            price_per_unit: None,
        }));
        assert!(validate_intent(&nameless, 0.6).is_err());
    }

    #[test]
    fn test_new_item_defaults() {
        let i = intent(IntentPayload::CreateInventoryItem(NewItemDraft {
            item_name: Some("Parle-G".to_string()),
            ..Default::default()
        }));
        let ActionPayload::CreateInventoryItem(item) = validate_intent(&i, 0.6).unwrap() else {
            panic!("expected new item");
        };
        assert_eq!(item.quantity, 0);
        assert_eq!(item.price_per_unit, Money::zero());
        assert_eq!(item.category, DEFAULT_ITEM_CATEGORY);

        let negative = intent(IntentPayload::CreateInventoryItem(NewItemDraft {
            item_name: Some("Parle-G".to_string()),
            quantity: Some(-1),
            ..Default::default()
        }));
        assert!(validate_intent(&negative, 0.6).is_err());
    }

    #[test]
    fn test_name_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_item_name(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
