//! # Ledger Errors
//!
//! Two enums live here. [`ValidationError`] means the interpreter's draft
//! cannot become an action at all; nothing is staged. [`CoreError`] means
//! a confirmed action ran into the owner's actual records and was refused.
//!
//! ```text
//!   draft ──validate──► ValidationError      (rejected before staging)
//!     │
//!     ▼ staged, confirmed
//!   store ─────────────► CoreError           (rejected at execution)
//!                           │
//!                           ▼
//!                DbError::Domain ──► AssistError ──► ErrorResponse
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// No item with this name (case-insensitive, trimmed) for the owner.
    /// Names are never fuzzy-matched: "Pepsi" does not find "Pepsi Max".
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A sale line asks for more than is on the shelf. The whole sale is
    /// refused and no line is decremented.
    ///
    /// ```text
    /// "sold 20 pepsi at 30", shelf holds 10
    ///   → InsufficientStock { item: "Pepsi", available: 10, requested: 20 }
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// A stock adjustment with `delta` would drop below zero.
    #[error("Adjusting {item} by {delta} would leave negative stock (current {current})")]
    NegativeStock {
        item: String,
        current: i64,
        delta: i64,
    },

    #[error("Item already exists: {0}")]
    DuplicateItem(String),

    #[error("Invalid action: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Why an interpreter draft was not staged.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is missing")]
    Required { field: String },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must lie in {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// An amount that does not parse, an unknown language code.
    #[error("{field} could not be read: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} is not one of {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    #[error("confidence {confidence} is below the minimum {min}")]
    LowConfidence { confidence: f32, min: f32 },

    /// Neither a stock change nor a new price.
    #[error("adjustment for {item} changes nothing")]
    EmptyAdjustment { item: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
