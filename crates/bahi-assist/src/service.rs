//! # Assist Service
//!
//! The two operations callers use: propose a command, then confirm or
//! cancel it.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Propose → Confirm Pipeline                          │
//! │                                                                         │
//! │  parse_intent(text)                                                     │
//! │     │                                                                   │
//! │     ├─► interpreter (bounded by timeout) ──✗──► { isAction: false }     │
//! │     ├─► validate_intent ───────────────────✗──► { isAction: false }     │
//! │     └─► stage ──► { isAction: true, confirmationId, preview, kind }     │
//! │                                                                         │
//! │  execute_action(id, confirmed)                                          │
//! │     │                                                                   │
//! │     ├─► stage.consume ─────✗──► NotFound / Unauthorized / Expired       │
//! │     ├─► confirmed = false ─────► { cancelled: true, message }           │
//! │     └─► executor ──────────────► { executed: true, result, message }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing spans the two calls except the staged entry.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AssistConfig;
use crate::error::{AssistError, AssistResult};
use crate::executor::ActionExecutor;
use crate::interpreter::{IntentInterpreter, Interpretation};
use crate::stage::ConfirmationStage;
use crate::sweeper::{StageSweeper, SweeperHandle};
use bahi_core::validation::validate_intent;
use bahi_core::{
    message, ActionKind, ActionResult, ConfirmationId, Language, OwnerId, DEFAULT_MIN_CONFIDENCE,
};
use bahi_db::Database;

const DEFAULT_INTERPRETER_TIMEOUT: Duration = Duration::from_secs(15);

// =============================================================================
// Responses
// =============================================================================

/// Outcome of proposing a command.
///
/// ```json
/// { "isAction": false, "reason": "Not an actionable command" }
/// { "isAction": true, "confirmationId": "…", "preview": "…", "actionKind": "RecordSale" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub is_action: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_id: Option<ConfirmationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_kind: Option<ActionKind>,
}

impl ParseResponse {
    pub fn not_action(reason: impl Into<String>) -> Self {
        ParseResponse {
            is_action: false,
            reason: Some(reason.into()),
            confirmation_id: None,
            preview: None,
            action_kind: None,
        }
    }

    pub fn staged(confirmation_id: ConfirmationId, preview: String, kind: ActionKind) -> Self {
        ParseResponse {
            is_action: true,
            reason: None,
            confirmation_id: Some(confirmation_id),
            preview: Some(preview),
            action_kind: Some(kind),
        }
    }
}

/// Outcome of confirming or cancelling a staged action.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResponse {
    Cancelled { message: String },
    Executed { result: ActionResult, message: String },
}

impl ExecuteResponse {
    pub fn message(&self) -> &str {
        match self {
            ExecuteResponse::Cancelled { message } | ExecuteResponse::Executed { message, .. } => {
                message
            }
        }
    }

    pub fn result(&self) -> Option<&ActionResult> {
        match self {
            ExecuteResponse::Executed { result, .. } => Some(result),
            ExecuteResponse::Cancelled { .. } => None,
        }
    }
}

/// `{ "cancelled": true, "message" }` or `{ "executed": true, "result", "message" }`.
impl Serialize for ExecuteResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExecuteResponse::Cancelled { message } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("cancelled", &true)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
            ExecuteResponse::Executed { result, message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("executed", &true)?;
                map.serialize_entry("result", result)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Front door of the pipeline. Cheap to share behind an `Arc`.
pub struct AssistService {
    db: Database,
    stage: Arc<ConfirmationStage>,
    executor: ActionExecutor,
    interpreter: Arc<dyn IntentInterpreter>,
    interpreter_timeout: Duration,
    min_confidence: f32,
}

impl AssistService {
    /// Creates a service with default TTL, timeout and confidence threshold.
    pub fn new(db: Database, interpreter: Arc<dyn IntentInterpreter>) -> Self {
        AssistService {
            executor: ActionExecutor::new(db.clone()),
            db,
            stage: Arc::new(ConfirmationStage::default()),
            interpreter,
            interpreter_timeout: DEFAULT_INTERPRETER_TIMEOUT,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Creates a service using the stage and interpreter settings of `config`.
    pub fn from_config(
        db: Database,
        interpreter: Arc<dyn IntentInterpreter>,
        config: &AssistConfig,
    ) -> Self {
        Self::new(db, interpreter)
            .with_ttl(config.stage_ttl())
            .with_interpreter_timeout(config.interpreter_timeout())
            .with_min_confidence(config.interpreter.min_confidence)
    }

    /// Sets the confirmation TTL. Replaces the (empty) stage.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.stage = Arc::new(ConfirmationStage::new(ttl));
        self
    }

    pub fn with_interpreter_timeout(mut self, timeout: Duration) -> Self {
        self.interpreter_timeout = timeout;
        self
    }

    pub fn with_min_confidence(mut self, min: f32) -> Self {
        self.min_confidence = min;
        self
    }

    pub fn stage(&self) -> &Arc<ConfirmationStage> {
        &self.stage
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Starts the background expiry task for this service's stage.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        StageSweeper::spawn(Arc::clone(&self.stage), interval)
    }

    // =========================================================================
    // Parse Intent
    // =========================================================================

    /// Interprets `text`, validates the intent and stages it.
    ///
    /// Interpreter failures and invalid intents are not errors here: they
    /// come back as `isAction: false` with a reason. Only storage failures
    /// while loading the owner's vocabulary are returned as `Err`.
    pub async fn parse_intent(
        &self,
        owner: &OwnerId,
        text: &str,
        language: Language,
    ) -> AssistResult<ParseResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ParseResponse::not_action("Empty command"));
        }

        let vocabulary = self.db.inventory().list_names(owner).await?;

        let interpreted = tokio::time::timeout(
            self.interpreter_timeout,
            self.interpreter.interpret(text, &vocabulary, language),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AssistError::Upstream(format!(
                "No reply within {}s",
                self.interpreter_timeout.as_secs()
            )))
        });

        let intent = match interpreted {
            Ok(Interpretation::Action(intent)) => intent,
            Ok(Interpretation::NotAnAction { reason }) => {
                info!(owner_id = %owner, reason = %reason, "Text is not an action");
                return Ok(ParseResponse::not_action(reason));
            }
            Err(e) => {
                warn!(owner_id = %owner, error = %e, "Interpreter failed");
                return Ok(ParseResponse::not_action("Could not understand the command"));
            }
        };

        let payload = match validate_intent(&intent, self.min_confidence) {
            Ok(payload) => payload,
            Err(e) => {
                info!(
                    owner_id = %owner,
                    kind = %intent.kind(),
                    reason = %e,
                    "Intent rejected by validation"
                );
                return Ok(ParseResponse::not_action(format!(
                    "Not an actionable command: {}",
                    e
                )));
            }
        };

        let kind = payload.kind();
        let preview = message::preview(&payload, language);
        let confirmation_id = self.stage.stage(owner, payload, language, text);

        Ok(ParseResponse::staged(confirmation_id, preview, kind))
    }

    // =========================================================================
    // Execute Action
    // =========================================================================

    /// Consumes the staged action, then executes it or cancels it.
    ///
    /// ## Errors
    /// - `NotFound` / `Unauthorized` / `Expired` from the stage
    /// - `NotFound` / `InsufficientStock` / `Duplicate` from the ledger
    /// - `Storage` on infrastructure failure (nothing is applied)
    pub async fn execute_action(
        &self,
        owner: &OwnerId,
        confirmation_id: &ConfirmationId,
        confirmed: bool,
        language: Language,
    ) -> AssistResult<ExecuteResponse> {
        let action = self.stage.consume(confirmation_id, owner)?;

        if !confirmed {
            info!(
                confirmation_id = %confirmation_id,
                owner_id = %owner,
                "Action cancelled"
            );
            return Ok(ExecuteResponse::Cancelled {
                message: message::cancelled(language),
            });
        }

        let result = self.executor.execute(&action).await?;
        let message = message::success(&result, language);

        Ok(ExecuteResponse::Executed { result, message })
    }
}
