//! The recalculation sweep itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::config::SweepConfig;
use crate::error::Result;
use crate::storage::{Storage, TaskStore};

/// Counters for one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Stale tasks picked up
    pub scanned: usize,
    /// Tasks whose new score was written
    pub updated: usize,
    /// Tasks completed or deleted between read and write
    pub skipped_inactive: usize,
    /// Tasks that exhausted their retries
    pub failed: usize,
    pub batches: usize,
    /// The pass stopped early because shutdown was requested
    pub cancelled: bool,
}

/// What happened when a sweep was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another pass was already in progress
    Skipped,
    Completed(SweepReport),
}

/// Releases the single-flight flag when a pass ends, even on error.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodically rescores active tasks whose score has gone stale.
pub struct RecalculationSweep<S: Storage> {
    storage: Arc<S>,
    config: SweepConfig,
    running: AtomicBool,
}

impl<S: Storage> RecalculationSweep<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, SweepConfig::default())
    }

    pub fn with_config(storage: Arc<S>, config: SweepConfig) -> Self {
        Self {
            storage,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Whether a pass is in progress right now.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one full pass at `now`.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        self.sweep_until(now, &CancellationToken::new())
    }

    /// Run one pass, checking `cancel` before each batch.
    ///
    /// A batch that has started always finishes. Returns `Skipped` without
    /// touching storage if another pass holds the flag.
    pub fn sweep_until(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<SweepOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Sweep already in progress, skipping");
            return Ok(SweepOutcome::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        let store = TaskStore::new(self.storage.as_ref());
        let cutoff = self.config.cutoff(now);
        let mut report = SweepReport::default();
        let mut after: Option<String> = None;

        tracing::debug!(cutoff = %cutoff, batch_size = self.config.batch_size, "Sweep started");

        loop {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let batch = store.find_stale(cutoff, after.as_deref(), self.config.batch_size)?;
            let Some(last) = batch.last() else {
                break;
            };
            after = Some(last.id.clone());
            report.batches += 1;
            report.scanned += batch.len();

            for task in &batch {
                self.rescore_with_retries(&store, &task.id, now, &mut report);
            }

            if batch.len() < self.config.batch_size {
                break;
            }
        }

        tracing::info!(
            scanned = report.scanned,
            updated = report.updated,
            skipped = report.skipped_inactive,
            failed = report.failed,
            cancelled = report.cancelled,
            "Sweep finished"
        );
        Ok(SweepOutcome::Completed(report))
    }

    fn rescore_with_retries(&self, store: &TaskStore<'_, S>, task_id: &str, now: DateTime<Utc>, report: &mut SweepReport) {
        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            match store.rescore_if_active(task_id, now) {
                Ok(Some(score)) => {
                    tracing::debug!(task_id, score, "Rescored task");
                    report.updated += 1;
                    return;
                }
                Ok(None) => {
                    tracing::debug!(task_id, "Task no longer active, score left alone");
                    report.skipped_inactive += 1;
                    return;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(task_id, attempt, error = %e, "Rescore failed, retrying");
                }
                Err(e) => {
                    tracing::error!(task_id, attempt, error = %e, "Rescore failed, giving up on task");
                    report.failed += 1;
                }
            }
        }
    }

    /// Sweep every `interval` until `cancel` fires.
    ///
    /// The first pass runs immediately. Ticks missed while a pass was running
    /// are dropped, not queued. Passes do blocking file I/O through
    /// `block_in_place`, so this needs the multi-thread runtime.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = self.config.interval.as_secs(), "Sweep loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Sweep loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let pass = tokio::task::block_in_place(|| self.sweep_until(Utc::now(), &cancel));
                    if let Err(e) = pass {
                        tracing::error!(error = %e, "Sweep pass aborted");
                    }
                }
            }
        }
    }
}
