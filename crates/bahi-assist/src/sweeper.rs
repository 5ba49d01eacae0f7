//! # Stage Sweeper
//!
//! Background task that expires stale confirmations on a fixed interval.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sweeper Task                                       │
//! │                                                                         │
//! │   spawn() ──► loop {                                                    │
//! │                 select! {                                               │
//! │                   interval.tick()  ─► stage.sweep(now)                  │
//! │                   shutdown_rx      ─► break                             │
//! │                 }                                                       │
//! │               }                                                         │
//! │                                                                         │
//! │   SweeperHandle::shutdown() sends the signal and joins the task.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::stage::ConfirmationStage;

/// Periodically removes expired entries from a [`ConfirmationStage`].
pub struct StageSweeper {
    stage: Arc<ConfirmationStage>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running sweeper.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to finish.
    pub async fn shutdown(self) {
        // The task may already be gone; joining below still succeeds.
        let _ = self.shutdown_tx.send(()).await;

        if let Err(e) = self.task.await {
            warn!(error = %e, "Stage sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl StageSweeper {
    /// Spawns the sweeper onto the current tokio runtime.
    pub fn spawn(stage: Arc<ConfirmationStage>, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let sweeper = StageSweeper {
            stage,
            interval,
            shutdown_rx,
        };
        let task = tokio::spawn(sweeper.run());

        SweeperHandle { shutdown_tx, task }
    }

    async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Stage sweeper starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = self.stage.sweep(Utc::now());
                    debug!(removed, "Sweep pass complete");
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Stage sweeper shutting down");
                    break;
                }
            }
        }

        info!("Stage sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bahi_core::{ActionPayload, ExpenseRequest, Language, Money, OwnerId};
    use chrono::Duration as ChronoDuration;

    fn stage_old_entry(stage: &ConfirmationStage) {
        stage.stage_at(
            &OwnerId::from("owner-1"),
            ActionPayload::RecordExpense(ExpenseRequest {
                amount: Money::from_rupees(10),
                description: "Tea".to_string(),
                category: "Staff".to_string(),
            }),
            Language::English,
            "",
            Utc::now() - ChronoDuration::seconds(120),
        );
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let stage = Arc::new(ConfirmationStage::new(Duration::from_secs(60)));
        stage_old_entry(&stage);
        assert_eq!(stage.len(), 1);

        let handle = StageSweeper::spawn(Arc::clone(&stage), Duration::from_millis(10));

        let mut attempts = 0;
        while !stage.is_empty() && attempts < 100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            attempts += 1;
        }
        assert!(stage.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let stage = Arc::new(ConfirmationStage::default());
        let handle = StageSweeper::spawn(stage, Duration::from_secs(3600));
        assert!(!handle.is_finished());
        handle.shutdown().await;
    }
}
