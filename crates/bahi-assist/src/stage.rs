//! # Confirmation Stage
//!
//! Holds validated actions between proposal and confirmation.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Staged Action Lifecycle                              │
//! │                                                                         │
//! │   stage() ──► STAGED ──┬── consume() by owner ──► removed, returned     │
//! │                        │                                                │
//! │                        ├── consume() after TTL ──► removed, Expired     │
//! │                        │                                                │
//! │                        ├── sweep(now) after TTL ─► removed              │
//! │                        │                                                │
//! │                        └── consume() by other ──► untouched,            │
//! │                                                   Unauthorized          │
//! │                                                                         │
//! │  Every transition happens under one mutex, so whichever caller         │
//! │  reaches an id first wins and every later caller sees NotFound.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is a `std::sync::Mutex`: critical sections are short, never await,
//! and never touch storage.

use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AssistError, AssistResult};
use bahi_core::{ActionPayload, ConfirmationId, Language, OwnerId, PendingAction};

/// Shared store of pending actions keyed by confirmation id.
#[derive(Debug)]
pub struct ConfirmationStage {
    entries: Mutex<HashMap<ConfirmationId, PendingAction>>,
    ttl: Duration,
}

impl ConfirmationStage {
    pub fn new(ttl: Duration) -> Self {
        ConfirmationStage {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConfirmationId, PendingAction>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, action: &PendingAction, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(action.created_at).to_std() {
            Ok(age) => age > self.ttl,
            // Created "in the future" relative to `now`
            Err(_) => false,
        }
    }

    // =========================================================================
    // Stage
    // =========================================================================

    /// Stages a validated action and returns its confirmation id.
    pub fn stage(
        &self,
        owner: &OwnerId,
        payload: ActionPayload,
        language: Language,
        original_text: &str,
    ) -> ConfirmationId {
        self.stage_at(owner, payload, language, original_text, Utc::now())
    }

    /// Stages an action with an explicit creation time.
    pub fn stage_at(
        &self,
        owner: &OwnerId,
        payload: ActionPayload,
        language: Language,
        original_text: &str,
        created_at: DateTime<Utc>,
    ) -> ConfirmationId {
        let mut action = PendingAction::new(
            owner.clone(),
            payload,
            language,
            original_text,
            created_at,
        );

        let mut entries = self.lock();
        while entries.contains_key(&action.confirmation_id) {
            action.confirmation_id = ConfirmationId::generate();
        }

        let id = action.confirmation_id.clone();
        info!(
            owner_id = %owner,
            confirmation_id = %id,
            kind = %action.kind,
            "Action staged"
        );
        entries.insert(id.clone(), action);
        id
    }

    // =========================================================================
    // Consume
    // =========================================================================

    /// Atomically removes and returns the action staged under `id`.
    ///
    /// Used for both confirm and cancel. The first caller wins.
    ///
    /// ## Errors
    /// - `NotFound`: unknown id, or already consumed or swept
    /// - `Unauthorized`: the action belongs to another owner (left in place)
    /// - `Expired`: older than the TTL (removed)
    pub fn consume(&self, id: &ConfirmationId, owner: &OwnerId) -> AssistResult<PendingAction> {
        self.consume_at(id, owner, Utc::now())
    }

    pub fn consume_at(
        &self,
        id: &ConfirmationId,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> AssistResult<PendingAction> {
        let mut entries = self.lock();

        let entry = match entries.entry(id.clone()) {
            Entry::Vacant(_) => {
                debug!(confirmation_id = %id, "Confirmation not found");
                return Err(AssistError::confirmation_not_found(id.as_str()));
            }
            Entry::Occupied(entry) => entry,
        };

        if entry.get().owner_id != *owner {
            warn!(
                confirmation_id = %id,
                owner_id = %owner,
                "Rejected consume by non-owner"
            );
            return Err(AssistError::unauthorized(id.as_str()));
        }

        if self.is_expired(entry.get(), now) {
            entry.remove();
            warn!(confirmation_id = %id, owner_id = %owner, "Confirmation expired");
            return Err(AssistError::Expired(id.to_string()));
        }

        let action = entry.remove();
        info!(
            confirmation_id = %id,
            owner_id = %owner,
            kind = %action.kind,
            "Action consumed"
        );
        Ok(action)
    }

    // =========================================================================
    // Sweep
    // =========================================================================

    /// Removes every entry older than the TTL. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, action| !self.is_expired(action, now));
        let removed = before - entries.len();

        if removed > 0 {
            info!(removed, remaining = entries.len(), "Swept expired confirmations");
        }
        removed
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of live entries staged by `owner`.
    pub fn pending_for(&self, owner: &OwnerId) -> usize {
        self.lock()
            .values()
            .filter(|action| action.owner_id == *owner)
            .count()
    }
}

impl Default for ConfirmationStage {
    fn default() -> Self {
        ConfirmationStage::new(Duration::from_secs(bahi_core::CONFIRMATION_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::{ExpenseRequest, Money};
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;

    fn expense() -> ActionPayload {
        ActionPayload::RecordExpense(ExpenseRequest {
            amount: Money::from_rupees(1200),
            description: "Electricity".to_string(),
            category: "Electricity".to_string(),
        })
    }

    #[test]
    fn test_consume_is_exactly_once() {
        let stage = ConfirmationStage::default();
        let owner = OwnerId::from("owner-1");
        let id = stage.stage(&owner, expense(), Language::English, "bijli 1200");

        let action = stage.consume(&id, &owner).unwrap();
        assert_eq!(action.confirmation_id, id);
        assert_eq!(action.original_text, "bijli 1200");

        assert!(matches!(
            stage.consume(&id, &owner),
            Err(AssistError::NotFound { .. })
        ));
        assert!(stage.is_empty());
    }

    #[test]
    fn test_wrong_owner_leaves_entry_intact() {
        let stage = ConfirmationStage::default();
        let owner = OwnerId::from("owner-1");
        let intruder = OwnerId::from("owner-2");
        let id = stage.stage(&owner, expense(), Language::English, "");

        assert!(matches!(
            stage.consume(&id, &intruder),
            Err(AssistError::Unauthorized { .. })
        ));
        assert_eq!(stage.pending_for(&owner), 1);
        assert!(stage.consume(&id, &owner).is_ok());
    }

    #[test]
    fn test_expired_consume_removes_entry() {
        let stage = ConfirmationStage::new(Duration::from_secs(300));
        let owner = OwnerId::from("owner-1");
        let created = Utc::now();
        let id = stage.stage_at(&owner, expense(), Language::English, "", created);

        let later = created + ChronoDuration::seconds(301);
        assert!(matches!(
            stage.consume_at(&id, &owner, later),
            Err(AssistError::Expired(_))
        ));
        assert!(matches!(
            stage.consume_at(&id, &owner, later),
            Err(AssistError::NotFound { .. })
        ));
    }

    #[test]
    fn test_sweep_removes_only_old_entries() {
        let stage = ConfirmationStage::new(Duration::from_secs(300));
        let owner = OwnerId::from("owner-1");
        let now = Utc::now();

        let old = stage.stage_at(
            &owner,
            expense(),
            Language::English,
            "",
            now - ChronoDuration::seconds(301),
        );
        let young = stage.stage_at(
            &owner,
            expense(),
            Language::English,
            "",
            now - ChronoDuration::seconds(299),
        );

        assert_eq!(stage.sweep(now), 1);
        assert_eq!(stage.len(), 1);
        assert!(matches!(
            stage.consume_at(&old, &owner, now),
            Err(AssistError::NotFound { .. })
        ));
        assert!(stage.consume_at(&young, &owner, now).is_ok());
    }

    #[test]
    fn test_pending_for_is_per_owner() {
        let stage = ConfirmationStage::default();
        let a = OwnerId::from("a");
        let b = OwnerId::from("b");
        stage.stage(&a, expense(), Language::English, "");
        stage.stage(&a, expense(), Language::Hindi, "");
        stage.stage(&b, expense(), Language::English, "");

        assert_eq!(stage.len(), 3);
        assert_eq!(stage.pending_for(&a), 2);
        assert_eq!(stage.pending_for(&b), 1);
    }

    #[test]
    fn test_concurrent_consumers_single_winner() {
        let stage = Arc::new(ConfirmationStage::default());
        let owner = OwnerId::from("owner-1");
        let id = stage.stage(&owner, expense(), Language::English, "");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stage = Arc::clone(&stage);
                let owner = owner.clone();
                let id = id.clone();
                std::thread::spawn(move || stage.consume(&id, &owner).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
