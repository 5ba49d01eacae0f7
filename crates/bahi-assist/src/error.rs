//! # Pipeline Error Types
//!
//! The caller-facing error taxonomy and its serialized form.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bahi                                   │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CoreError ────────┼──► DbError ──► AssistError ──► ErrorResponse       │
//! │  sqlx::Error ──────┘                    ▲           { code, message,    │
//! │                                         │             available? }      │
//! │  Stage (NotFound / Unauthorized / Expired)                              │
//! │  Interpreter (Upstream)                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable. Storage failures are logged in full and
//! reach the caller only as a generic INTERNAL message.

use serde::Serialize;
use thiserror::Error;

use bahi_core::{CoreError, ValidationError};
use bahi_db::DbError;

// =============================================================================
// Assist Error
// =============================================================================

#[derive(Debug, Error)]
pub enum AssistError {
    /// Incomplete or malformed intent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Unknown item or confirmation id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A sale or adjustment asked for more stock than exists.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// An item with the same name already exists.
    #[error("Item already exists: {0}")]
    Duplicate(String),

    /// Requester does not own the staged action.
    ///
    /// Displays exactly like `NotFound` so the wrong caller learns nothing
    /// about the entry.
    #[error("{entity} not found: {id}")]
    Unauthorized { entity: String, id: String },

    /// Interpreter unavailable, timed out, or replied with garbage.
    #[error("Interpreter unavailable: {0}")]
    Upstream(String),

    /// Staged action outlived its TTL.
    #[error("Confirmation {0} has expired")]
    Expired(String),

    /// Infrastructure failure in the ledger store.
    #[error("Storage error: {0}")]
    Storage(DbError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AssistError {
    pub fn confirmation_not_found(id: impl Into<String>) -> Self {
        AssistError::NotFound {
            entity: "Confirmation".to_string(),
            id: id.into(),
        }
    }

    pub fn unauthorized(id: impl Into<String>) -> Self {
        AssistError::Unauthorized {
            entity: "Confirmation".to_string(),
            id: id.into(),
        }
    }

    /// The precise kind, for logs. [`ErrorResponse`] reports `Unauthorized`
    /// as `NOT_FOUND` so a wrong caller cannot tell the id exists.
    pub fn code(&self) -> ErrorCode {
        match self {
            AssistError::Validation(_) | AssistError::Duplicate(_) => ErrorCode::ValidationError,
            AssistError::NotFound { .. } => ErrorCode::NotFound,
            AssistError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            AssistError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AssistError::Upstream(_) => ErrorCode::UpstreamError,
            AssistError::Expired(_) => ErrorCode::Expired,
            AssistError::Storage(_) | AssistError::Config(_) => ErrorCode::Internal,
        }
    }
}

/// Maps ledger rule violations onto the taxonomy.
impl From<CoreError> for AssistError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(name) => AssistError::NotFound {
                entity: "Item".to_string(),
                id: name,
            },
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => AssistError::InsufficientStock {
                item,
                available,
                requested,
            },
            CoreError::NegativeStock {
                item,
                current,
                delta,
            } => AssistError::InsufficientStock {
                item,
                available: current,
                requested: -delta,
            },
            CoreError::DuplicateItem(name) => AssistError::Duplicate(name),
            CoreError::Validation(e) => AssistError::Validation(e),
        }
    }
}

impl From<DbError> for AssistError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => AssistError::NotFound { entity, id },
            other => AssistError::Storage(other),
        }
    }
}

/// Result type for pipeline operations.
pub type AssistResult<T> = Result<T, AssistError>;

// =============================================================================
// Error Response
// =============================================================================

/// Error codes for responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InsufficientStock,
    Unauthorized,
    UpstreamError,
    Expired,
    Internal,
}

/// What a caller receives when an operation fails.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Pepsi: available 10, requested 20", "available": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl From<&AssistError> for ErrorResponse {
    fn from(err: &AssistError) -> Self {
        let message = match err {
            AssistError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Storage operation failed");
                "Something went wrong while saving. Nothing was recorded.".to_string()
            }
            AssistError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                "Service is misconfigured".to_string()
            }
            other => other.to_string(),
        };

        let available = match err {
            AssistError::InsufficientStock { available, .. } => Some(*available),
            _ => None,
        };

        let code = match err {
            AssistError::Unauthorized { .. } => ErrorCode::NotFound,
            other => other.code(),
        };

        ErrorResponse {
            code,
            message,
            available,
        }
    }
}

impl From<AssistError> for ErrorResponse {
    fn from(err: AssistError) -> Self {
        ErrorResponse::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_looks_like_not_found() {
        let not_found = AssistError::confirmation_not_found("abc");
        let unauthorized = AssistError::unauthorized("abc");
        assert_eq!(not_found.to_string(), unauthorized.to_string());
        assert_eq!(unauthorized.code(), ErrorCode::Unauthorized);

        // The caller sees exactly what a missing id would produce
        assert_eq!(ErrorResponse::from(&unauthorized), ErrorResponse::from(&not_found));
        let json = serde_json::to_value(ErrorResponse::from(&unauthorized)).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn test_db_domain_errors_are_unwrapped() {
        let err: AssistError = DbError::Domain(CoreError::InsufficientStock {
            item: "Pepsi".to_string(),
            available: 10,
            requested: 20,
        })
        .into();
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, ErrorCode::InsufficientStock);
        assert_eq!(response.available, Some(10));

        let err: AssistError = DbError::Domain(CoreError::ItemNotFound("Ghee".to_string())).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_negative_stock_is_a_stock_violation() {
        let err: AssistError = CoreError::NegativeStock {
            item: "Dal".to_string(),
            current: 2,
            delta: -3,
        }
        .into();
        assert!(matches!(
            err,
            AssistError::InsufficientStock { available: 2, requested: 3, .. }
        ));
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err: AssistError = DbError::QueryFailed("disk I/O error".to_string()).into();
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, ErrorCode::Internal);
        assert!(!response.message.contains("disk"));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::UpstreamError).unwrap();
        assert_eq!(json, "\"UPSTREAM_ERROR\"");

        let response = ErrorResponse::from(AssistError::Expired("abc".to_string()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "EXPIRED");
        assert!(json.get("available").is_none());
    }
}
